pub mod errors;
pub mod otp;
pub mod routes;
pub mod server;

use crate::connection;

pub struct AppState {
    /// Read side of the session owned by the connection supervisor
    pub connection: connection::ConnectionHandle,
}
