//! Outbound mail: configuration, the transport seam, the SMTP gateway, and
//! the bulk dispatcher with its delivery report.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod report;
pub mod smtp;
pub mod transport;

pub use config::{MailerConfig, SenderCredentials};
pub use dispatcher::BulkDispatcher;
pub use error::{MailerError, TransportError};
pub use report::{DeliveryOutcome, DeliveryReport, DeliveryStatus};
pub use smtp::{SmtpConnector, SmtpGateway};
pub use transport::{Connector, DispatchTask, Gateway, OutgoingMessage, html_from_plain};
