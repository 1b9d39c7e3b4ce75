use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Anything of the form `scheme://...`
static HAS_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("valid scheme regex"));

/// A host-looking reference without a scheme, e.g. `img.example.com/cert.png`
static BARE_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.-]+\.([A-Za-z]{2,})(?:$|/|\?)").expect("valid bare domain regex")
});

/// `https://host/https://other/...` produced by joining an absolute URL onto a path
static NESTED_ABSOLUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^/]+/(https?://.+)$").expect("valid nested absolute regex")
});

/// `https://host/www.other.com/...` produced by joining a schemeless host onto a path
static HOST_IN_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^/]+/(www\.[^/]+/.+)$").expect("valid host regex"));

/// Final labels that mark a file name rather than a top-level domain
const FILE_LABELS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "htm", "html", "php",
    "asp", "aspx", "jsp",
];

/// Turns a reference found in page markup into an absolute URL
///
/// # Resolution Rules
///
/// 1. References that already carry a scheme are returned unchanged
/// 2. Protocol-relative references (`//host/...`) get `https:`
/// 3. Bare domains (`img.example.com/...`) get `https://`
/// 4. Everything else is joined onto `base_url`, then repaired:
///    - a nested `http(s)://` URL inside the path replaces the whole URL
///    - a `www.<host>/` first path segment is promoted to the host
///
/// A reference that cannot be resolved is returned as-is; callers filter
/// non-HTTP results.
///
/// # Examples
///
/// ```
/// use cert_sieve::url::absolutize;
///
/// let base = "https://www.example.com/company/certs.html";
/// assert_eq!(absolutize(base, "//cdn.example.com/a.pdf"), "https://cdn.example.com/a.pdf");
/// assert_eq!(absolutize(base, "/files/a.pdf"), "https://www.example.com/files/a.pdf");
/// assert_eq!(
///     absolutize(base, "/www.static.example.net/img/cert.jpg"),
///     "https://www.static.example.net/img/cert.jpg"
/// );
/// ```
pub fn absolutize(base_url: &str, reference: &str) -> String {
    let reference = reference.trim();

    if reference.is_empty() || HAS_SCHEME.is_match(reference) {
        return reference.to_string();
    }

    if let Some(rest) = reference.strip_prefix("//") {
        return format!("https://{}", rest);
    }

    if is_bare_domain(reference) {
        return format!("https://{}", reference.trim_start_matches('/'));
    }

    let joined = match Url::parse(base_url).and_then(|base| base.join(reference)) {
        Ok(joined) => joined.to_string(),
        Err(e) => {
            tracing::debug!("Could not resolve '{}' against {}: {}", reference, base_url, e);
            return reference.to_string();
        }
    };

    repair_joined(&joined)
}

fn is_bare_domain(reference: &str) -> bool {
    BARE_DOMAIN
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .map(|label| !FILE_LABELS.contains(&label.as_str().to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Collapses doubled-host URLs produced by sites that emit half-absolute links
fn repair_joined(joined: &str) -> String {
    if let Some(caps) = NESTED_ABSOLUTE.captures(joined) {
        return caps[1].to_string();
    }

    if let Some(caps) = HOST_IN_PATH.captures(joined) {
        return format!("https://{}", &caps[1]);
    }

    joined.to_string()
}
