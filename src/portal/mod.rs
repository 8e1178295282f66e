//! Access point and config server: the captive portal.
//!
//! When the device cannot get online it becomes its own network. The portal
//! brings up the fallback access point, waits for an operator to associate,
//! and serves one HTTP connection at a time on the well-known port. A valid
//! credential submission is persisted and answered with a device restart;
//! everything else gets the config form or a pointer to it.
//!
//! This is not a general HTTP server. One request per connection, no
//! keep-alive, no TLS, and only the first kilobyte of a request is ever
//! read. A slow client blocks the next one, which is fine for a
//! single-operator bring-up flow.

mod request;

pub use request::{Request, RequestError, MAX_REQUEST_BYTES};

use crate::config::{Credentials, DeviceConfig};
use crate::net::{poll_until, AccessPoint, NetError, Restart};
use crate::store::{ConfigStore, StoreError};
use log::{error, info, warn};
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::time::Duration;

/// The configuration path, the only one the portal really serves.
pub const CONFIG_PATH: &str = "/config";

/// Well-known HTTP port the firmware listens on.
pub const DEFAULT_PORT: u16 = 80;

/// Poll interval for AP activation and client association.
const AP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sent for any request that isn't about configuration.
const REDIRECT_BODY: &str =
    "Invalid request, please visit /config to configure wifi credentials";

/// The captive portal.
pub struct ConfigPortal {
    bind_addr: SocketAddr,
    form_path: PathBuf,
}

/// What serving one connection did.
#[derive(Debug, PartialEq, Eq)]
enum Served {
    /// A response went out and the connection is done.
    Responded,
    /// New credentials were persisted; the caller must restart the device.
    /// No response is sent on this path.
    ConfigSaved,
}

impl ConfigPortal {
    /// A portal that will listen on `bind_addr` and serve the form page
    /// stored at `form_path`.
    pub fn new(bind_addr: SocketAddr, form_path: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr,
            form_path: form_path.into(),
        }
    }

    /// Run the portal. Never returns; every exit is a device restart.
    ///
    /// Per-connection failures are logged and the loop moves on to the next
    /// `accept`. A failure of the listener itself (bind, accept) means this
    /// boot cycle cannot serve and is resolved by restarting.
    pub fn run(
        self,
        ap: &mut impl AccessPoint,
        restart: &impl Restart,
        mut config: DeviceConfig,
        store: &ConfigStore,
    ) -> ! {
        if let Err(e) = bring_up(ap, &config.hotspot) {
            error!("access point bring-up failed: {}", e);
            restart.restart();
        }

        let listener = match self.listen() {
            Ok(listener) => listener,
            Err(e) => {
                error!("cannot bind config server on {}: {}", self.bind_addr, e);
                restart.restart();
            }
        };
        info!("config server listening on {}", self.bind_addr);

        loop {
            match listener.accept() {
                Ok((mut stream, peer)) => {
                    info!("got a connection from {}", peer);
                    match self.serve(&mut stream, &mut config, store) {
                        Ok(Served::ConfigSaved) => {
                            info!("credentials received, restarting to apply");
                            restart.restart();
                        }
                        Ok(Served::Responded) => {}
                        Err(e) => warn!("connection closed: {}", e),
                    }
                }
                Err(e) => {
                    error!("listener failed: {}", e);
                    restart.restart();
                }
            }
        }
    }

    fn listen(&self) -> io::Result<TcpListener> {
        TcpListener::bind(self.bind_addr)
    }

    /// Serve a single connection: read, classify, respond or persist.
    fn serve(
        &self,
        stream: &mut (impl Read + Write),
        config: &mut DeviceConfig,
        store: &ConfigStore,
    ) -> Result<Served, PortalError> {
        let request = Request::read_from(stream)?;

        match classify(&request) {
            Action::Submit { ssid, password } => {
                info!("new wifi ssid: {}", ssid);
                config.wifi = Credentials::new(ssid, password);
                store.save(config)?;
                Ok(Served::ConfigSaved)
            }
            Action::ShowForm => {
                // A missing page file fails this request rather than
                // answering with an empty body.
                let page = fs::read_to_string(&self.form_path)?;
                respond(stream, "text/html", &page)?;
                Ok(Served::Responded)
            }
            Action::Redirect => {
                respond(stream, "text/plain", REDIRECT_BODY)?;
                Ok(Served::Responded)
            }
        }
    }
}

/// Make the access point discoverable and wait for an operator.
///
/// Skips activation if the AP is already up. The association wait has no
/// deadline; the device sits here until someone joins.
pub fn bring_up(ap: &mut impl AccessPoint, hotspot: &Credentials) -> Result<(), NetError> {
    if ap.is_active() {
        info!("access point already active");
    } else {
        info!("creating access point: {}", hotspot.ssid);
        ap.activate(&hotspot.ssid, &hotspot.password)?;
        poll_until(AP_POLL_INTERVAL, || ap.is_active());
        info!("access point active");
    }

    info!("waiting for a client to associate");
    poll_until(AP_POLL_INTERVAL, || ap.has_client());
    info!("client associated");
    Ok(())
}

/// What a request asks of the portal.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    /// Both credential fields present on the config path.
    Submit { ssid: String, password: String },
    /// Config path without a full credential pair.
    ShowForm,
    /// Everything else.
    Redirect,
}

fn classify(request: &Request) -> Action {
    let on_config_path =
        request.method == "GET" && (request.path == CONFIG_PATH || request.path == "/config/");
    if !on_config_path {
        return Action::Redirect;
    }

    match (request.field("ssid"), request.field("password")) {
        (Some(ssid), Some(password)) => Action::Submit {
            ssid: ssid.to_string(),
            password: password.to_string(),
        },
        _ => Action::ShowForm,
    }
}

fn respond(stream: &mut impl Write, content_type: &str, body: &str) -> io::Result<()> {
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        content_type,
        body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body.as_bytes())?;
    stream.flush()
}

/// Errors while handling one portal connection.
#[derive(Debug)]
pub enum PortalError {
    /// The request never arrived or didn't parse.
    Request(RequestError),
    /// Persisting a submission failed.
    Store(StoreError),
    /// Responding failed, or the form page was unreadable.
    Io(io::Error),
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(e) => write!(f, "bad request: {}", e),
            Self::Store(e) => write!(f, "failed to persist credentials: {}", e),
            Self::Io(e) => write!(f, "connection error: {}", e),
        }
    }
}

impl std::error::Error for PortalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<RequestError> for PortalError {
    fn from(e: RequestError) -> Self {
        Self::Request(e)
    }
}

impl From<StoreError> for PortalError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<io::Error> for PortalError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn unique_path(suffix: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let pid = std::process::id();
        env::temp_dir().join(format!("bauble-portal-test-{}-{}.{}", pid, id, suffix))
    }

    /// In-memory connection: canned request in, captured response out.
    struct FakeConn {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl FakeConn {
        fn new(request: &str) -> Self {
            Self {
                input: Cursor::new(request.as_bytes().to_vec()),
                output: Vec::new(),
            }
        }

        fn response(&self) -> String {
            String::from_utf8_lossy(&self.output).into_owned()
        }
    }

    impl Read for FakeConn {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for FakeConn {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Scripted access point double.
    struct FakeAp {
        active: bool,
        client_joined: bool,
        activated_with: Option<(String, String)>,
    }

    impl FakeAp {
        fn down() -> Self {
            Self {
                active: false,
                client_joined: true,
                activated_with: None,
            }
        }

        fn already_active() -> Self {
            Self {
                active: true,
                ..Self::down()
            }
        }
    }

    impl AccessPoint for FakeAp {
        fn activate(&mut self, ssid: &str, password: &str) -> Result<(), NetError> {
            self.activated_with = Some((ssid.to_string(), password.to_string()));
            self.active = true;
            Ok(())
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn has_client(&self) -> bool {
            self.client_joined
        }
    }

    fn portal_with_form(page: &str) -> (ConfigPortal, PathBuf) {
        let form_path = unique_path("html");
        fs::write(&form_path, page).unwrap();
        let portal = ConfigPortal::new("127.0.0.1:0".parse().unwrap(), &form_path);
        (portal, form_path)
    }

    // ==================== classify ====================

    #[test]
    fn test_classify_submit() {
        let req = Request::parse(b"GET /config?ssid=net&password=pw HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(
            classify(&req),
            Action::Submit {
                ssid: "net".to_string(),
                password: "pw".to_string()
            }
        );
    }

    #[test]
    fn test_classify_form_when_a_field_is_missing() {
        let bare = Request::parse(b"GET /config HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(classify(&bare), Action::ShowForm);

        let half = Request::parse(b"GET /config?ssid=net HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(classify(&half), Action::ShowForm);

        let other_half = Request::parse(b"GET /config?password=pw HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(classify(&other_half), Action::ShowForm);
    }

    #[test]
    fn test_classify_trailing_slash() {
        let req = Request::parse(b"GET /config/ HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(classify(&req), Action::ShowForm);
    }

    #[test]
    fn test_classify_other_paths_redirect() {
        let root = Request::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(classify(&root), Action::Redirect);

        let favicon = Request::parse(b"GET /favicon.ico HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(classify(&favicon), Action::Redirect);
    }

    #[test]
    fn test_classify_non_get_redirects() {
        let req = Request::parse(b"POST /config?ssid=a&password=b HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(classify(&req), Action::Redirect);
    }

    // ==================== serve ====================

    #[test]
    fn test_form_request_serves_the_page_and_writes_nothing() {
        let (portal, form_path) = portal_with_form("<html>form</html>");
        let store_path = unique_path("json");
        let store = ConfigStore::new(&store_path);
        let mut config = DeviceConfig::default();

        let mut conn = FakeConn::new("GET /config HTTP/1.1\r\n\r\n");
        let served = portal.serve(&mut conn, &mut config, &store).unwrap();

        assert_eq!(served, Served::Responded);
        let response = conn.response();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("<html>form</html>"));
        assert!(!store_path.exists(), "showing the form must not persist");

        let _ = fs::remove_file(&form_path);
    }

    #[test]
    fn test_submission_persists_decoded_credentials_without_response() {
        let (portal, form_path) = portal_with_form("unused");
        let store_path = unique_path("json");
        let store = ConfigStore::new(&store_path);
        let mut config = DeviceConfig {
            hotspot: Credentials::new("bauble-setup", "twinkle123"),
            ..Default::default()
        };

        let mut conn =
            FakeConn::new("GET /config?ssid=foo%20bar&password=baz%2Bqux HTTP/1.1\r\n\r\n");
        let served = portal.serve(&mut conn, &mut config, &store).unwrap();

        assert_eq!(served, Served::ConfigSaved);
        assert!(conn.output.is_empty(), "no response before the restart");

        let on_disk = store.load().unwrap();
        assert_eq!(on_disk.wifi.ssid, "foo bar");
        assert_eq!(on_disk.wifi.password, "baz+qux");
        assert_eq!(on_disk.hotspot.ssid, "bauble-setup");

        let _ = fs::remove_file(&form_path);
        let _ = fs::remove_file(&store_path);
    }

    #[test]
    fn test_other_requests_get_the_redirect_message() {
        let (portal, form_path) = portal_with_form("unused");
        let store_path = unique_path("json");
        let store = ConfigStore::new(&store_path);
        let mut config = DeviceConfig::default();

        let mut conn = FakeConn::new("GET /anything HTTP/1.1\r\n\r\n");
        let served = portal.serve(&mut conn, &mut config, &store).unwrap();

        assert_eq!(served, Served::Responded);
        assert!(conn.response().ends_with(REDIRECT_BODY));
        assert_eq!(config, DeviceConfig::default());
        assert!(!store_path.exists());

        let _ = fs::remove_file(&form_path);
    }

    #[test]
    fn test_missing_form_page_fails_the_request() {
        let portal = ConfigPortal::new("127.0.0.1:0".parse().unwrap(), unique_path("html"));
        let store = ConfigStore::new(unique_path("json"));
        let mut config = DeviceConfig::default();

        let mut conn = FakeConn::new("GET /config HTTP/1.1\r\n\r\n");
        let result = portal.serve(&mut conn, &mut config, &store);

        assert!(matches!(result, Err(PortalError::Io(_))));
        assert!(conn.output.is_empty(), "no empty-body response");
    }

    #[test]
    fn test_unreadable_request_fails_the_connection() {
        let (portal, form_path) = portal_with_form("unused");
        let store = ConfigStore::new(unique_path("json"));
        let mut config = DeviceConfig::default();

        let mut conn = FakeConn::new("");
        let result = portal.serve(&mut conn, &mut config, &store);

        assert!(matches!(result, Err(PortalError::Request(_))));

        let _ = fs::remove_file(&form_path);
    }

    // ==================== bring_up & listening ====================

    #[test]
    fn test_bring_up_activates_with_the_hotspot_identity() {
        let mut ap = FakeAp::down();
        let hotspot = Credentials::new("bauble-setup", "twinkle123");

        bring_up(&mut ap, &hotspot).unwrap();

        assert_eq!(
            ap.activated_with,
            Some(("bauble-setup".to_string(), "twinkle123".to_string()))
        );
    }

    #[test]
    fn test_bring_up_skips_an_active_ap() {
        let mut ap = FakeAp::already_active();
        bring_up(&mut ap, &Credentials::default()).unwrap();
        assert_eq!(ap.activated_with, None);
    }

    #[test]
    fn test_empty_config_reaches_listening_unconditionally() {
        // First-boot scenario: file absent, hotspot identity empty. The
        // portal still brings the AP up with what it has and binds.
        let config = DeviceConfig::default();
        let mut ap = FakeAp::down();

        bring_up(&mut ap, &config.hotspot).unwrap();
        assert_eq!(ap.activated_with, Some((String::new(), String::new())));

        let portal = ConfigPortal::new("127.0.0.1:0".parse().unwrap(), unique_path("html"));
        let listener = portal.listen().expect("portal must reach listening");
        drop(listener);
    }

    #[test]
    fn test_bind_conflict_is_an_error() {
        let holder = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = holder.local_addr().unwrap();

        let portal = ConfigPortal::new(addr, unique_path("html"));
        assert!(portal.listen().is_err());
    }
}
