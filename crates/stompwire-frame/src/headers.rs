//! Order-preserving STOMP header mapping.
//!
//! Serialization must be deterministic, so headers keep their insertion
//! order. Names are unique within a frame.

/// Login name for the CONNECT handshake.
pub const LOGIN: &str = "login";
/// Passcode for the CONNECT handshake.
pub const PASSCODE: &str = "passcode";
/// Durable client identifier, sent with CONNECT.
pub const CLIENT_ID: &str = "client-id";
/// Queue or topic a frame targets.
pub const DESTINATION: &str = "destination";
/// Transaction identifier for SEND/ACK/BEGIN/COMMIT/ABORT.
pub const TRANSACTION: &str = "transaction";
/// Acknowledgement mode for SUBSCRIBE.
pub const ACK: &str = "ack";
/// Broker-assigned message identifier on MESSAGE frames.
pub const MESSAGE_ID: &str = "message-id";
/// Receipt request attached to a client frame.
pub const RECEIPT: &str = "receipt";
/// Receipt confirmation on a broker RECEIPT frame.
pub const RECEIPT_ID: &str = "receipt-id";
/// Byte length of the body, required for bodies with embedded NULs.
pub const CONTENT_LENGTH: &str = "content-length";
/// Broker session identifier on CONNECTED frames.
pub const SESSION: &str = "session";
/// Protocol version, negotiated on CONNECT/CONNECTED.
pub const VERSION: &str = "version";
/// Broker software identification on CONNECTED frames.
pub const SERVER: &str = "server";

/// An insertion-ordered header map with unique names.
///
/// Lookup is linear; STOMP frames carry a handful of headers at most.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a header, replacing the value in place if the name exists.
    ///
    /// Replacement keeps the name's original position, so re-setting a
    /// header never reorders the serialized frame.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Insert only if the name is not already present.
    ///
    /// Returns true when the header was inserted. The decoder uses this
    /// so the first occurrence of a repeated header line wins.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains_key(&name) {
            false
        } else {
            self.entries.push((name, value.into()));
            true
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Remove a header, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let mut headers = Headers::new();
        headers.insert("zeta", "1");
        headers.insert("alpha", "2");
        headers.insert("mu", "3");

        let names: Vec<_> = headers.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["zeta", "alpha", "mu"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut headers = Headers::new();
        headers.insert("destination", "/queue/a");
        headers.insert("transaction", "tx1");
        headers.insert("destination", "/queue/b");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("destination"), Some("/queue/b"));
        let names: Vec<_> = headers.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["destination", "transaction"]);
    }

    #[test]
    fn test_insert_if_absent() {
        let mut headers = Headers::new();
        assert!(headers.insert_if_absent("foo", "first"));
        assert!(!headers.insert_if_absent("foo", "second"));
        assert_eq!(headers.get("foo"), Some("first"));
    }

    #[test]
    fn test_remove() {
        let mut headers = Headers::new();
        headers.insert("receipt", "42");
        assert_eq!(headers.remove("receipt"), Some("42".to_string()));
        assert_eq!(headers.remove("receipt"), None);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_from_iterator_deduplicates() {
        let headers: Headers = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("a"), Some("3"));

        let pairs: Vec<_> = headers.into_iter().collect();
        assert_eq!(
            pairs,
            [
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }
}
