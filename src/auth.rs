//! Viewer identity and authorization.
//!
//! Sessions are handled by the proxy in front of this service, which
//! forwards the signed-in user's email and GitHub handle as request
//! headers.  Whether a viewer may see administrative reports is decided
//! by an [`AuthorizationPolicy`].

use axum::http::HeaderMap;

/// Header carrying the signed-in user's email.
pub const EMAIL_HEADER: &str = "x-user-email";
/// Header carrying the signed-in user's GitHub handle.
pub const GITHUB_HEADER: &str = "x-github-username";

/// The user making a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub email: Option<String>,
    pub github_username: Option<String>,
}

impl Viewer {
    /// Reads the identity headers.  Blank values are treated as absent
    /// and emails are lowercased.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            email: read(EMAIL_HEADER).map(|e| e.to_lowercase()),
            github_username: read(GITHUB_HEADER),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.email.is_some() || self.github_username.is_some()
    }
}

/// Decides which viewers are administrators.
///
/// Policies must be thread-safe (`Send + Sync`) because they are shared
/// across request handlers.
pub trait AuthorizationPolicy: Send + Sync {
    fn is_admin(&self, viewer: &Viewer) -> bool;
}

/// Grants admin rights to a fixed list of email addresses.
#[derive(Debug, Clone, Default)]
pub struct AdminEmailPolicy {
    emails: Vec<String>,
}

impl AdminEmailPolicy {
    /// Normalises the list: entries are trimmed, lowercased and blanks
    /// dropped.
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl AuthorizationPolicy for AdminEmailPolicy {
    fn is_admin(&self, viewer: &Viewer) -> bool {
        viewer
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .is_some_and(|e| self.emails.contains(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn admin_list_is_normalised() {
        let policy = AdminEmailPolicy::new(" Admin@Example.com ,, ops@example.com".split(','));
        let viewer = |email: &str| Viewer {
            email: Some(email.into()),
            github_username: None,
        };
        assert!(policy.is_admin(&viewer("ADMIN@example.com")));
        assert!(policy.is_admin(&viewer("ops@example.com")));
        assert!(!policy.is_admin(&viewer("")));
        assert!(!policy.is_admin(&Viewer::default()));
        assert!(AdminEmailPolicy::new(["", "  "]).is_empty());
    }

    #[test]
    fn github_handle_alone_is_not_admin() {
        let policy = AdminEmailPolicy::new(["octo@example.com"]);
        let viewer = Viewer {
            email: None,
            github_username: Some("octo".into()),
        };
        assert!(viewer.is_signed_in());
        assert!(!policy.is_admin(&viewer));
    }

    #[test]
    fn viewer_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(EMAIL_HEADER, HeaderValue::from_static(" Me@Example.com "));
        headers.insert(GITHUB_HEADER, HeaderValue::from_static(""));
        let viewer = Viewer::from_headers(&headers);
        assert_eq!(viewer.email.as_deref(), Some("me@example.com"));
        assert_eq!(viewer.github_username, None);

        assert!(!Viewer::from_headers(&HeaderMap::new()).is_signed_in());
    }
}
