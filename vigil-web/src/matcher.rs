use axum::http::Method;

/// Selects the requests an access rule applies to.
///
/// Path patterns use ant-style wildcards:
///
/// | pattern        | matches                               |
/// |----------------|---------------------------------------|
/// | `/messages`    | exactly `/messages`                   |
/// | `/messages/*`  | `/messages/1`, not `/messages/1/read` |
/// | `/admin/**`    | `/admin`, `/admin/users/42`, ...      |
/// | `/*.css`       | `/site.css`                           |
#[derive(Clone, Debug)]
pub struct RequestMatcher {
    method: Option<Method>,
    pattern: Option<Vec<String>>,
    raw: String,
}

impl RequestMatcher {
    /// Match every request.
    pub fn any() -> Self {
        Self {
            method: None,
            pattern: None,
            raw: "/**".to_string(),
        }
    }

    /// Match requests whose path fits the ant-style `pattern`.
    pub fn ant(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let segments = if raw == "/**" || raw == "**" {
            None
        } else {
            Some(split_path(&raw).map(str::to_string).collect())
        };
        Self {
            method: None,
            pattern: segments,
            raw,
        }
    }

    /// Restrict the matcher to one HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn pattern(&self) -> &str {
        &self.raw
    }

    pub fn http_method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        if let Some(expected) = &self.method {
            if expected != method {
                return false;
            }
        }
        match &self.pattern {
            None => true,
            Some(pattern) => {
                let path: Vec<&str> = split_path(path).collect();
                match_segments(pattern, &path)
            }
        }
    }
}

impl std::fmt::Display for RequestMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{method} {}", self.raw),
            None => f.write_str(&self.raw),
        }
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_segments(pattern: &[String], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((head, rest)) if head == "**" => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((head, rest)) => match path.split_first() {
            Some((segment, path_rest)) => {
                let pattern: Vec<char> = head.chars().collect();
                let text: Vec<char> = segment.chars().collect();
                match_segment(&pattern, &text) && match_segments(rest, path_rest)
            }
            None => false,
        },
    }
}

/// Glob match of a single segment; `*` spans any run of characters, `?` one.
fn match_segment(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|skip| match_segment(rest, &text[skip..])),
        Some(('?', rest)) => !text.is_empty() && match_segment(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && match_segment(rest, &text[1..]),
    }
}
