#[rocket::launch]
fn rocket() -> _ {
    bulk_mailer::rocket()
}
