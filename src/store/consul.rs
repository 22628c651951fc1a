use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, trace};
use serde::Deserialize;
use std::time::Duration;

use super::{Config, KvEntry, KvStore, StoreError};

/// One element of the `/v1/kv` JSON response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KvPair {
    key: String,
    #[serde(default)]
    value: Option<String>,
}

/// Blocking client for the Consul KV HTTP API
pub struct ConsulClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
    authorization: Option<String>,
}

impl ConsulClient {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(30))
            .build();

        let authorization = config.auth.as_ref().map(|auth| {
            let credentials = format!("{}:{}", auth.username, auth.password);
            format!("Basic {}", STANDARD.encode(credentials))
        });

        Self {
            agent,
            base_url: config.base_url(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            authorization,
        }
    }

    /// URL of a KV prefix with each path segment percent-encoded
    fn kv_url(&self, prefix: &str) -> String {
        let path: Vec<String> = prefix
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/v1/kv/{}", self.base_url, path.join("/"))
    }

    /// Issue a GET and decode the JSON body
    ///
    /// A 404 means nothing exists under the prefix and yields `None`.
    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: ureq::Request,
        url: &str,
    ) -> Result<Option<T>, StoreError> {
        let mut request = request;
        if let Some(token) = &self.token {
            request = request.set("X-Consul-Token", token);
        }
        if let Some(authorization) = &self.authorization {
            request = request.set("Authorization", authorization);
        }

        debug!("GET {}", url);
        match request.call() {
            Ok(response) => {
                let body = response
                    .into_json::<T>()
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                Ok(Some(body))
            }
            Err(ureq::Error::Status(404, _)) => {
                trace!("No keys at {}", url);
                Ok(None)
            }
            Err(ureq::Error::Status(code, _)) => Err(StoreError::Status {
                code,
                url: url.to_string(),
            }),
            Err(ureq::Error::Transport(e)) => Err(StoreError::Transport(e.to_string())),
        }
    }
}

impl KvStore for ConsulClient {
    fn list(&self, prefix: &str) -> Result<Vec<KvEntry>, StoreError> {
        let url = self.kv_url(prefix);
        let request = self.agent.get(&url).query("recurse", "");
        let pairs: Vec<KvPair> = self.get_json(request, &url)?.unwrap_or_default();

        pairs
            .into_iter()
            .map(|pair| -> Result<KvEntry, StoreError> {
                let value = match pair.value {
                    Some(encoded) => STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                        StoreError::Decode(format!("value of {}: {}", pair.key, e))
                    })?,
                    None => Vec::new(),
                };
                Ok(KvEntry::new(pair.key, value))
            })
            .collect()
    }

    fn keys(&self, prefix: &str, separator: &str) -> Result<Vec<String>, StoreError> {
        let url = self.kv_url(prefix);
        let request = self
            .agent
            .get(&url)
            .query("keys", "")
            .query("separator", separator);
        Ok(self.get_json(request, &url)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BasicAuth;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answer a single HTTP request with `body`, returning the request line
    fn serve_once(body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            request_line.trim_end().to_string()
        });

        (addr, handle)
    }

    #[test]
    fn test_kv_url_strips_leading_slash() {
        let client = ConsulClient::new(&Config::new("127.0.0.1:8500"));
        assert_eq!(client.kv_url("/svc/"), "http://127.0.0.1:8500/v1/kv/svc/");
        assert_eq!(client.kv_url("/"), "http://127.0.0.1:8500/v1/kv/");
        assert_eq!(client.kv_url("app/web"), "http://127.0.0.1:8500/v1/kv/app/web");
    }

    #[test]
    fn test_kv_url_escapes_segments() {
        let client = ConsulClient::new(&Config::new("127.0.0.1:8500"));
        assert_eq!(
            client.kv_url("app#1/web"),
            "http://127.0.0.1:8500/v1/kv/app%231/web"
        );
        assert_eq!(
            client.kv_url("a?b/with space/"),
            "http://127.0.0.1:8500/v1/kv/a%3Fb/with%20space/"
        );
    }

    #[test]
    fn test_list_sends_escaped_path_with_recurse() {
        let (addr, server) = serve_once(r#"[{"Key":"app#1/web/PORT","Value":"ODA="}]"#);
        let client = ConsulClient::new(&Config::new(addr));

        let entries = client.list("app#1/web").unwrap();
        let request_line = server.join().unwrap();

        assert!(
            request_line.starts_with("GET /v1/kv/app%231/web?recurse"),
            "{}",
            request_line
        );
        assert!(request_line.ends_with(" HTTP/1.1"));
        assert_eq!(entries, vec![KvEntry::new("app#1/web/PORT", "80")]);
    }

    #[test]
    fn test_keys_sends_escaped_path_with_separator() {
        let (addr, server) = serve_once(r#"["svc?x/HOST","svc?x/db/"]"#);
        let client = ConsulClient::new(&Config::new(addr));

        let keys = client.keys("svc?x/", "/").unwrap();
        let request_line = server.join().unwrap();

        assert!(request_line.starts_with("GET /v1/kv/svc%3Fx/?keys"), "{}", request_line);
        assert!(request_line.contains("separator=%2F"), "{}", request_line);
        assert_eq!(keys, vec!["svc?x/HOST", "svc?x/db/"]);
    }

    #[test]
    fn test_authorization_header() {
        let mut config = Config::new("127.0.0.1:8500");
        config.auth = Some(BasicAuth::parse("user:pass").unwrap());
        config.token = Some(String::new());

        let client = ConsulClient::new(&config);
        assert_eq!(client.authorization.as_deref(), Some("Basic dXNlcjpwYXNz"));
        assert!(client.token.is_none());
    }

    #[test]
    fn test_kv_pair_decodes_null_value() {
        let pairs: Vec<KvPair> = serde_json::from_str(
            r#"[{"Key":"svc/","Value":null,"Flags":0},{"Key":"svc/PORT","Value":"ODA=","Flags":0}]"#,
        )
        .unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].key, "svc/");
        assert!(pairs[0].value.is_none());
        assert_eq!(STANDARD.decode(pairs[1].value.as_deref().unwrap()).unwrap(), b"80");
    }
}
