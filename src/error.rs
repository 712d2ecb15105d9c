use std::fmt::{Debug, Display};

pub struct Error {
    kind: ErrorKind,
    context: Vec<String>,
}

pub enum ErrorKind {
    Io(std::io::Error),
    FantocciniNewSession(fantoccini::error::NewSessionError),
    FantocciniCmdError(fantoccini::error::CmdError),
    Template(minijinja::Error),
    Image(image::ImageError),
    Pdf(lopdf::Error),
    Config(toml::de::Error),
    Json(serde_json::Error),
    Other(String),
}

pub trait AddContext<T> {
    fn add_context(self, ctx: &str) -> Result<T, Error>;
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut context = self.context.clone();
        context.reverse();
        let context = if context.is_empty() {
            String::from("no context")
        } else {
            context.join(" -> ")
        };
        write!(f, "{context}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            ErrorKind::FantocciniNewSession(e) => Some(e),
            ErrorKind::FantocciniCmdError(e) => Some(e),
            ErrorKind::Template(e) => Some(e),
            ErrorKind::Image(e) => Some(e),
            ErrorKind::Pdf(e) => Some(e),
            ErrorKind::Config(e) => Some(e),
            ErrorKind::Json(e) => Some(e),
            ErrorKind::Other(_) => None,
        }
    }
}

macro_rules! impl_from {
    ($source:ty, $variant:ident) => {
        impl From<$source> for Error {
            fn from(value: $source) -> Self {
                Error {
                    context: vec![format!("{:?}", value)],
                    kind: ErrorKind::$variant(value),
                }
            }
        }
    };
}

impl_from!(std::io::Error, Io);
impl_from!(fantoccini::error::NewSessionError, FantocciniNewSession);
impl_from!(fantoccini::error::CmdError, FantocciniCmdError);
impl_from!(minijinja::Error, Template);
impl_from!(image::ImageError, Image);
impl_from!(lopdf::Error, Pdf);
impl_from!(toml::de::Error, Config);
impl_from!(serde_json::Error, Json);

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error {
            context: vec![value.to_string()],
            kind: ErrorKind::Other(value),
        }
    }
}

impl Error {
    /// Add more context to the given error. This context will ultimately be displayed to the user
    /// and could be useful for correcting bad input or filing a help ticket.
    ///
    /// Generally a single layer of context should be added for every level that an error is
    /// surfaced. If the error is surfaced all the way to main and not handled there, then all the
    /// context will be displayed to the user in reverse order
    ///
    /// # Arguments
    /// * `context` - Any additional information that would be useful for the user to see if the
    /// error is surfaced to them
    pub fn add_context(self, context: &str) -> Error {
        let mut existing = self.context.clone();
        existing.push(context.to_string());
        Self {
            context: existing,
            ..self
        }
    }

    /// The underlying failure this error wraps.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl<T> AddContext<T> for Result<T, Error> {
    fn add_context(self, ctx: &str) -> Result<T, Error> {
        match self {
            Ok(d) => Ok(d),
            Err(e) => Err(e.add_context(ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_displayed_outermost_first() {
        let err = Error::from(String::from("boom"))
            .add_context("rasterizing page 2")
            .add_context("generating job sheet");
        assert_eq!(
            err.to_string(),
            "generating job sheet -> rasterizing page 2 -> boom"
        );
        assert!(matches!(err.kind(), ErrorKind::Other(_)));
    }
}
