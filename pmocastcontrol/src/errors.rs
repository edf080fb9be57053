use thiserror::Error;

/// Erreurs du control point.
///
/// Les variantes distinguent ce que l'opérateur doit savoir: device
/// injoignable (réseau), URI refusée, lecture refusée, réponse SOAP
/// inexploitable.
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Device is unreachable: {0}")]
    DeviceUnreachable(String),
    #[error("Device rejected the media URI: UPnP error {0}: {1}")]
    UriRejected(String, String),
    #[error("Device refused to start playback: UPnP error {0}: {1}")]
    PlaybackRejected(String, String),
    #[error("{0} returned UPnP error {1}: {2}")]
    ActionRejected(String, String, String),
    #[error("{0} failed with HTTP status {1}: {2}")]
    ActionFailed(String, u16, String),
    #[error("No SOAP envelope in {0} response")]
    NoEnvelope(String),
    #[error("Missing {0} element in SOAP body")]
    MissingReturnValue(String),
    #[error("Invalid {0} value: {1}")]
    BadReturnValue(String, String),
    #[error("Failed to build SOAP request for {0}: {1}")]
    RequestBuild(String, String),
}

impl ControlError {
    pub fn missing_return_value(value: &str) -> Self {
        ControlError::MissingReturnValue(value.to_string())
    }

    pub fn bad_return_value(name: &str, value: &str) -> Self {
        ControlError::BadReturnValue(name.to_string(), value.to_string())
    }
}
