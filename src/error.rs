//! Error types and handling for the `FlightOnTime` service

use thiserror::Error;

/// Terminal state a failed prediction request ends in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller supplied bad input (400)
    Rejected,
    /// Infrastructure not ready (503)
    Unavailable,
    /// Internal defect while building features or classifying (500)
    Failed,
}

/// Main error type for the `FlightOnTime` service
#[derive(Error, Debug)]
pub enum FlightOnTimeError {
    /// Airport code unknown to the directory
    #[error("Airport '{code}' not found")]
    AirportNotFound { code: String },

    /// Malformed or incomplete request
    #[error("Invalid input: {message}")]
    InvalidRequest { message: String },

    /// No classifier was loaded at startup
    #[error("Prediction model is not available")]
    ModelUnavailable,

    /// A column the classifier needs could not be produced or defaulted
    #[error("Required feature '{name}' is missing")]
    MissingRequiredFeature { name: String },

    /// A reconciled value could not be turned into a float
    #[error("Feature '{name}' cannot be converted to a number (value: {value})")]
    FeatureCoercion { name: String, value: String },

    /// Classifier returned NaN, out-of-range probabilities or an unknown label
    #[error("Invalid model output: {message}")]
    InvalidModelOutput { message: String },

    /// Classifier refused the feature vector
    #[error("Inference error: {message}")]
    Inference { message: String },

    /// Weather provider failed; always recovered with the simulated snapshot
    #[error("Weather fetch failed: {message}")]
    WeatherFetch { message: String },

    /// Model artifact could not be read or is inconsistent
    #[error("Model load error: {message}")]
    ModelLoad { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl FlightOnTimeError {
    /// Create a new airport-not-found error
    pub fn airport_not_found<S: Into<String>>(code: S) -> Self {
        Self::AirportNotFound { code: code.into() }
    }

    /// Create a new invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a new missing feature error
    pub fn missing_feature<S: Into<String>>(name: S) -> Self {
        Self::MissingRequiredFeature { name: name.into() }
    }

    /// Create a new coercion error
    pub fn coercion<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self::FeatureCoercion {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a new invalid model output error
    pub fn invalid_output<S: Into<String>>(message: S) -> Self {
        Self::InvalidModelOutput {
            message: message.into(),
        }
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(message: S) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    /// Create a new weather fetch error
    pub fn weather<S: Into<String>>(message: S) -> Self {
        Self::WeatherFetch {
            message: message.into(),
        }
    }

    /// Create a new model load error
    pub fn model_load<S: Into<String>>(message: S) -> Self {
        Self::ModelLoad {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Terminal state this error puts a request into
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::AirportNotFound { .. } | Self::InvalidRequest { .. } => ErrorClass::Rejected,
            Self::ModelUnavailable => ErrorClass::Unavailable,
            _ => ErrorClass::Failed,
        }
    }

    /// Get a caller-facing message. Internal errors stay opaque.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AirportNotFound { code } => format!("Aeropuerto '{code}' no encontrado."),
            Self::InvalidRequest { message } => format!("Solicitud inválida: {message}"),
            Self::ModelUnavailable => "Modelo ML no disponible".to_string(),
            Self::MissingRequiredFeature { .. }
            | Self::FeatureCoercion { .. }
            | Self::InvalidModelOutput { .. }
            | Self::Inference { .. } => "Error en predicción del modelo".to_string(),
            _ => "Error interno del servidor".to_string(),
        }
    }
}
