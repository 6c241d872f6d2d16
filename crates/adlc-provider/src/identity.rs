/// Tag attached to rewarded units when no identity is available.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Identity collaborator. Sampled once per rewarded load success.
pub trait IdentitySource: Send + Sync {
    fn current_identity(&self) -> Option<String>;
}

/// No signed-in user.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

impl IdentitySource for AnonymousIdentity {
    fn current_identity(&self) -> Option<String> {
        None
    }
}

/// Always the same identity.
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub String);

impl IdentitySource for FixedIdentity {
    fn current_identity(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Verification tag for `source`: the current identity, or
/// [`ANONYMOUS_IDENTITY`] when there is none or it is blank.
pub fn identity_tag(source: &dyn IdentitySource) -> String {
    source
        .current_identity()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| ANONYMOUS_IDENTITY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identity_falls_back_to_anonymous() {
        assert_eq!(identity_tag(&AnonymousIdentity), "anonymous");
        assert_eq!(identity_tag(&FixedIdentity("  ".into())), "anonymous");
        assert_eq!(identity_tag(&FixedIdentity("uid-42".into())), "uid-42");
    }
}
