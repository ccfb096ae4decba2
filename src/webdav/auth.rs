/// Longest username or password handed to the server.
pub const CREDENTIAL_BUFFER_LIMIT: usize = 256;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub(crate) fn truncated(self) -> Credentials {
        Credentials {
            username: truncate_at_char_boundary(self.username, CREDENTIAL_BUFFER_LIMIT),
            password: truncate_at_char_boundary(self.password, CREDENTIAL_BUFFER_LIMIT),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Answers a 401/407 challenge.
///
/// `attempt` counts the challenges already answered for the current request,
/// starting at 0. Returning `None` gives up; the transport also stops on its
/// own once its attempt allowance is spent.
pub trait AuthenticationChallengeHandler: Send + Sync {
    fn authenticate(&self, realm: &str, attempt: u32) -> Option<Credentials>;
}

impl<F> AuthenticationChallengeHandler for F
where
    F: Fn(&str, u32) -> Option<Credentials> + Send + Sync,
{
    fn authenticate(&self, realm: &str, attempt: u32) -> Option<Credentials> {
        self(realm, attempt)
    }
}

/// Hands out the credentials captured when the session was created.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    pub fn new(username: &str, password: &str) -> StaticCredentials {
        StaticCredentials {
            credentials: Credentials::new(username, password),
        }
    }
}

impl AuthenticationChallengeHandler for StaticCredentials {
    fn authenticate(&self, _realm: &str, _attempt: u32) -> Option<Credentials> {
        Some(self.credentials.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Challenge {
    pub scheme: String,
    pub realm: String,
}

impl Challenge {
    pub fn is_basic(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("basic")
    }
}

/// Splits a `WWW-Authenticate` style header value into its challenges, e.g.
/// `Negotiate, Basic realm="files"` gives two.
pub(crate) fn parse_challenges(value: &str) -> Vec<Challenge> {
    let mut challenges: Vec<Challenge> = Vec::new();
    for item in split_outside_quotes(value) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (head, rest) = item.split_once(char::is_whitespace).unwrap_or((item, ""));
        if head.contains('=') || rest.trim_start().starts_with('=') {
            // auth-param of the challenge before it
            if let Some(current) = challenges.last_mut() {
                apply_param(current, item);
            }
            continue;
        }
        let mut challenge = Challenge {
            scheme: head.to_string(),
            realm: String::new(),
        };
        apply_param(&mut challenge, rest.trim());
        challenges.push(challenge);
    }
    challenges
}

fn apply_param(challenge: &mut Challenge, param: &str) {
    if let Some((key, value)) = param.split_once('=') {
        if key.trim().eq_ignore_ascii_case("realm") {
            challenge.realm = value.trim().trim_matches('"').to_string();
        }
    }
}

fn split_outside_quotes(value: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                items.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&value[start..]);
    items
}

fn truncate_at_char_boundary(mut value: String, limit: usize) -> String {
    if value.len() <= limit {
        return value;
    }
    let mut end = limit;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value.truncate(end);
    value
}
