use adlc_config::ProviderSettings;
use adlc_schemas::{FailureClass, LoadFailure};
use tracing::debug;

/// Maps a vendor error into the stable failure taxonomy.
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, code: Option<i64>, message: &str) -> FailureClass;

    /// Classify and wrap as a [`LoadFailure`].
    fn failure(&self, code: Option<i64>, message: &str) -> LoadFailure {
        LoadFailure::new(self.classify(code, message), code, message)
    }
}

/// Code and substring based classifier.
///
/// Checked in order: no-fill codes, no-fill signatures, transient
/// signatures. Anything else is terminal. Signature matching is
/// case-sensitive, as vendor messages are stable strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureClassifier {
    transient_signatures: Vec<String>,
    no_fill_codes: Vec<i64>,
    no_fill_signatures: Vec<String>,
}

impl SignatureClassifier {
    pub fn new(
        transient_signatures: Vec<String>,
        no_fill_codes: Vec<i64>,
        no_fill_signatures: Vec<String>,
    ) -> Self {
        Self {
            transient_signatures,
            no_fill_codes,
            no_fill_signatures,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::new(
            settings.transient_signatures.clone(),
            settings.no_fill_codes.clone(),
            settings.no_fill_signatures.clone(),
        )
    }
}

impl FailureClassifier for SignatureClassifier {
    fn classify(&self, code: Option<i64>, message: &str) -> FailureClass {
        let class = if code.is_some_and(|c| self.no_fill_codes.contains(&c))
            || self.no_fill_signatures.iter().any(|s| message.contains(s.as_str()))
        {
            FailureClass::NoFill
        } else if self
            .transient_signatures
            .iter()
            .any(|s| message.contains(s.as_str()))
        {
            FailureClass::Transient
        } else {
            FailureClass::Terminal
        };
        debug!(?code, message, class = class.as_str(), "classified provider failure");
        class
    }
}
