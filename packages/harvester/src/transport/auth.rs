//! HTTP authentication: credentials, challenge parsing and Digest responses.
//!
//! Basic is sent preemptively. Once a server answers with a Digest challenge
//! the challenge is kept and every later request carries a Digest
//! `Authorization` header instead. NTLM and Negotiate challenges are ignored.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};

/// Username/password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// One challenge from a `WWW-Authenticate` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChallenge {
    Digest(DigestChallenge),
    Basic { realm: Option<String> },
    /// NTLM, Negotiate and anything else this client does not answer.
    Unsupported(String),
}

/// Parameters of a Digest challenge (RFC 7616, MD5 family only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    /// `auth` when the server offers it, otherwise the legacy RFC 2069 form.
    pub qop_auth: bool,
    pub session: bool,
}

/// Parse the value of a `WWW-Authenticate` header into its challenges.
///
/// # Examples
/// ```
/// use catalog_harvester::transport::{parse_challenges, AuthChallenge};
///
/// let challenges = parse_challenges(r#"NTLM, Digest realm="csw", nonce="abc", qop="auth""#);
/// assert!(matches!(challenges[0], AuthChallenge::Unsupported(_)));
/// assert!(matches!(challenges[1], AuthChallenge::Digest(_)));
/// ```
pub fn parse_challenges(value: &str) -> Vec<AuthChallenge> {
    let mut raw: Vec<(String, Vec<(String, String)>)> = Vec::new();
    let mut rest = value;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }

        let token_end = rest
            .find(|c: char| c == '=' || c == ',' || c.is_whitespace())
            .unwrap_or(rest.len());
        let token = &rest[..token_end];
        let after = rest[token_end..].trim_start();

        match raw.last_mut() {
            Some((_, params)) if after.starts_with('=') => {
                let (param_value, remaining) = read_param_value(after[1..].trim_start());
                params.push((token.to_ascii_lowercase(), param_value));
                rest = remaining;
            }
            _ => {
                raw.push((token.to_string(), Vec::new()));
                rest = &rest[token_end..];
            }
        }
    }

    raw.into_iter()
        .map(|(scheme, params)| build_challenge(&scheme, &params))
        .collect()
}

fn read_param_value(input: &str) -> (String, &str) {
    let Some(quoted) = input.strip_prefix('"') else {
        let end = input.find(',').unwrap_or(input.len());
        return (input[..end].trim().to_string(), &input[end..]);
    };

    let mut value = String::new();
    let mut escaped = false;
    for (idx, c) in quoted.char_indices() {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return (value, &quoted[idx + 1..]);
        } else {
            value.push(c);
        }
    }
    (value, "")
}

fn build_challenge(scheme: &str, params: &[(String, String)]) -> AuthChallenge {
    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };

    if scheme.eq_ignore_ascii_case("basic") {
        return AuthChallenge::Basic {
            realm: param("realm"),
        };
    }
    if !scheme.eq_ignore_ascii_case("digest") {
        return AuthChallenge::Unsupported(scheme.to_string());
    }

    let algorithm = param("algorithm").unwrap_or_else(|| "MD5".to_string());
    let session = if algorithm.eq_ignore_ascii_case("MD5") {
        false
    } else if algorithm.eq_ignore_ascii_case("MD5-sess") {
        true
    } else {
        return AuthChallenge::Unsupported(format!("Digest algorithm={algorithm}"));
    };

    let Some(nonce) = param("nonce") else {
        return AuthChallenge::Unsupported("Digest without nonce".to_string());
    };

    AuthChallenge::Digest(DigestChallenge {
        realm: param("realm").unwrap_or_default(),
        nonce,
        opaque: param("opaque"),
        qop_auth: param("qop")
            .map(|qop| qop.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")))
            .unwrap_or(false),
        session,
    })
}

/// Pick the Digest challenge among all `WWW-Authenticate` header values.
pub fn select_digest<'a, I>(header_values: I) -> Option<DigestChallenge>
where
    I: IntoIterator<Item = &'a str>,
{
    header_values
        .into_iter()
        .flat_map(parse_challenges)
        .find_map(|challenge| match challenge {
            AuthChallenge::Digest(digest) => Some(digest),
            AuthChallenge::Basic { .. } | AuthChallenge::Unsupported(_) => None,
        })
}

fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Compute the Digest `response` value.
pub fn digest_response(
    challenge: &DigestChallenge,
    credentials: &Credentials,
    method: &str,
    uri: &str,
    nonce_count: &str,
    cnonce: &str,
) -> String {
    let mut ha1 = md5_hex(&format!(
        "{}:{}:{}",
        credentials.username, challenge.realm, credentials.password
    ));
    if challenge.session {
        ha1 = md5_hex(&format!("{ha1}:{}:{cnonce}", challenge.nonce));
    }
    let ha2 = md5_hex(&format!("{method}:{uri}"));

    if challenge.qop_auth {
        md5_hex(&format!(
            "{ha1}:{}:{nonce_count}:{cnonce}:auth:{ha2}",
            challenge.nonce
        ))
    } else {
        md5_hex(&format!("{ha1}:{}:{ha2}", challenge.nonce))
    }
}

/// A cached Digest challenge plus its nonce counter.
#[derive(Debug, Clone)]
pub struct DigestSession {
    challenge: DigestChallenge,
    nonce_count: u32,
}

impl DigestSession {
    pub fn new(challenge: DigestChallenge) -> Self {
        Self {
            challenge,
            nonce_count: 0,
        }
    }

    /// Build the next `Authorization` header value for `method` on `uri`.
    pub fn authorization(&mut self, credentials: &Credentials, method: &str, uri: &str) -> String {
        self.nonce_count += 1;
        let nc = format!("{:08x}", self.nonce_count);
        let cnonce = make_cnonce(self.nonce_count);
        let response = digest_response(&self.challenge, credentials, method, uri, &nc, &cnonce);

        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\", algorithm={}",
            credentials.username,
            self.challenge.realm,
            self.challenge.nonce,
            uri,
            response,
            if self.challenge.session { "MD5-sess" } else { "MD5" },
        );
        if self.challenge.qop_auth {
            header.push_str(&format!(", qop=auth, nc={nc}, cnonce=\"{cnonce}\""));
        } else if self.challenge.session {
            header.push_str(&format!(", cnonce=\"{cnonce}\""));
        }
        if let Some(opaque) = &self.challenge.opaque {
            header.push_str(&format!(", opaque=\"{opaque}\""));
        }
        header
    }
}

fn make_cnonce(counter: u32) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    md5_hex(&format!("{nanos}:{counter}"))[..16].to_string()
}
