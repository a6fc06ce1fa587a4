#[macro_use]
extern crate rocket;

pub mod config;
pub mod error;
pub mod mailer;
pub mod recipients;
pub mod request_logger;
pub mod routes;

use crate::config::ServerConfig;
use crate::mailer::{BulkDispatcher, MailerConfig};
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::Once;

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();
    log::info!("Starting bulk mailer API server");

    let server_config = ServerConfig::from_env();
    let mailer_config = MailerConfig::from_env();

    if let Err(err) = mailer_config.credentials() {
        log::warn!("{}. Dispatch requests will fail until this is fixed.", err);
    }
    log::info!(
        "SMTP relay {}:{}, upload limit {} bytes",
        mailer_config.smtp_host,
        mailer_config.smtp_port,
        server_config.max_upload_bytes
    );

    // Configure CORS
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .to_cors()
        .expect("Error creating CORS");

    rocket::custom(server_config.figment())
        .attach(RequestLogger)
        .attach(cors)
        .manage(BulkDispatcher::smtp(mailer_config))
        .register("/", routes::catchers::all())
        .mount(
            "/api",
            openapi_get_routes![
                routes::health::health_check,
                routes::upload::upload,
                routes::send::send,
            ],
        )
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Bulk Mailer API", "../../openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::config::ServerConfig;
    use crate::mailer::{
        BulkDispatcher, Connector, DispatchTask, Gateway, MailerConfig, MailerError,
        OutgoingMessage, TransportError,
    };

    pub const TEST_SENDER: &str = "sender@example.com";
    pub const TEST_SECRET: &str = "test-app-password";

    /// In-memory gateway with scripted reachability and per-recipient behavior.
    #[derive(Default)]
    pub struct ScriptedGateway {
        unreachable: bool,
        failures: HashMap<String, String>,
        delays: HashMap<String, Duration>,
        panics: Vec<String>,
        verify_calls: AtomicUsize,
        sent: Mutex<Vec<String>>,
        last_message: Mutex<Option<OutgoingMessage>>,
    }

    impl ScriptedGateway {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the reachability check.
        pub fn unreachable(mut self) -> Self {
            self.unreachable = true;
            self
        }

        /// Reject sends to `address` with `detail`.
        pub fn fail_recipient(mut self, address: &str, detail: &str) -> Self {
            self.failures.insert(address.to_string(), detail.to_string());
            self
        }

        /// Hold the send to `address` for `delay` before settling.
        pub fn delay_recipient(mut self, address: &str, delay: Duration) -> Self {
            self.delays.insert(address.to_string(), delay);
            self
        }

        /// Panic inside the send task for `address`.
        pub fn panic_on(mut self, address: &str) -> Self {
            self.panics.push(address.to_string());
            self
        }

        pub fn verify_calls(&self) -> usize {
            self.verify_calls.load(Ordering::SeqCst)
        }

        /// Recipients whose send was attempted, in settle order.
        pub fn sent(&self) -> Vec<String> {
            self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
        }

        pub fn last_message(&self) -> Option<OutgoingMessage> {
            self.last_message
                .lock()
                .ok()
                .and_then(|message| message.clone())
        }
    }

    #[rocket::async_trait]
    impl Gateway for ScriptedGateway {
        async fn verify_reachable(&self) -> Result<(), TransportError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            if self.unreachable {
                Err(TransportError::Unreachable)
            } else {
                Ok(())
            }
        }

        async fn send_one(&self, task: &DispatchTask) -> Result<(), TransportError> {
            let recipient = task.recipient.as_str();
            if self.panics.iter().any(|address| address == recipient) {
                panic!("scripted panic for {recipient}");
            }
            if let Some(delay) = self.delays.get(recipient) {
                tokio::time::sleep(*delay).await;
            }

            if let Ok(mut sent) = self.sent.lock() {
                sent.push(recipient.to_string());
            }
            if let Ok(mut last) = self.last_message.lock() {
                *last = Some(task.message.as_ref().clone());
            }

            match self.failures.get(recipient) {
                Some(detail) => Err(TransportError::Rejected(detail.clone())),
                None => Ok(()),
            }
        }
    }

    /// Connector that enforces credentials like the SMTP one, then hands out
    /// a shared [`ScriptedGateway`].
    pub struct ScriptedConnector {
        gateway: Arc<ScriptedGateway>,
    }

    impl ScriptedConnector {
        pub fn new(gateway: Arc<ScriptedGateway>) -> Self {
            Self { gateway }
        }
    }

    impl Connector for ScriptedConnector {
        fn configure(&self, config: &MailerConfig) -> Result<Arc<dyn Gateway>, MailerError> {
            config.credentials()?;
            Ok(self.gateway.clone())
        }
    }

    /// Dispatcher wired to `gateway` with test credentials.
    pub fn scripted_dispatcher(gateway: Arc<ScriptedGateway>) -> BulkDispatcher {
        BulkDispatcher::new(
            MailerConfig::for_sender(TEST_SENDER, TEST_SECRET),
            Arc::new(ScriptedConnector::new(gateway)),
        )
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        dispatcher: Option<BulkDispatcher>,
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            Self::with_server_config(&ServerConfig::default())
        }

        /// Start a builder applying the upload limits from `config`.
        pub fn with_server_config(config: &ServerConfig) -> Self {
            let figment = config
                .figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                mounts: Vec::new(),
                dispatcher: None,
            }
        }

        /// Mount routes under `/api`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api".to_string(), routes));
            self
        }

        /// Manage the dispatcher used by the send and health routes.
        pub fn manage_dispatcher(mut self, dispatcher: BulkDispatcher) -> Self {
            self.dispatcher = Some(dispatcher);
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket =
                rocket::custom(self.figment).register("/", crate::routes::catchers::all());

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(dispatcher) = self.dispatcher {
                rocket = rocket.manage(dispatcher);
            }

            rocket
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
