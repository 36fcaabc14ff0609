//! Codec trait and implementations for turning tokens into bytes.
//!
//! The session layer deals in [`Request`] and [`ServerReply`] values and
//! never looks at the wire. A [`Codec`] decides what those values look
//! like as bytes, so the same server can speak bare text tokens to a
//! `telnet` user and JSON strings to a browser.
//!
//! Decoding a request is infallible. Bytes that are not valid UTF-8, not
//! valid JSON, or not a known token all decode to [`Request::Unknown`].

use crate::{ProtocolError, Request, ServerReply};

/// Converts between protocol values and raw message bytes.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task the server spawns.
///
/// The server only needs [`encode_reply`](Codec::encode_reply) and
/// [`decode_request`](Codec::decode_request). The other two methods are
/// the client side of the same format.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a server reply into one message.
    ///
    /// # Errors
    /// Returns [`ProtocolError`] if the format cannot represent the reply.
    fn encode_reply(&self, reply: &ServerReply) -> Result<Vec<u8>, ProtocolError>;

    /// Decodes one client message. Never fails.
    fn decode_request(&self, data: &[u8]) -> Request;

    /// Serializes a client request into one message.
    ///
    /// # Errors
    /// Returns [`ProtocolError`] if the format cannot represent the request.
    fn encode_request(&self, request: Request) -> Result<Vec<u8>, ProtocolError>;

    /// Decodes one server message. Unrecognised payloads come back as
    /// `ServerReply::Status(Response::Unknown)`.
    fn decode_reply(&self, data: &[u8]) -> ServerReply;
}

// ---------------------------------------------------------------------------
// TextCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that puts the bare token on the wire: `START`, `OK`,
/// `3 3 7 7`. This is the default format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn encode_reply(&self, reply: &ServerReply) -> Result<Vec<u8>, ProtocolError> {
        Ok(reply.to_string().into_bytes())
    }

    fn decode_request(&self, data: &[u8]) -> Request {
        std::str::from_utf8(data)
            .map(Request::parse)
            .unwrap_or(Request::Unknown)
    }

    fn encode_request(&self, request: Request) -> Result<Vec<u8>, ProtocolError> {
        Ok(request.as_str().as_bytes().to_vec())
    }

    fn decode_reply(&self, data: &[u8]) -> ServerReply {
        std::str::from_utf8(data)
            .map(ServerReply::parse)
            .unwrap_or(ServerReply::Status(crate::Response::Unknown))
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Tokens travel as JSON strings (`"START"`, `"GAME_WON"`) and player
/// details as an object (`{"row":3,"col":3,"height":7,"width":7}`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use mazerunner_protocol::{Codec, JsonCodec, Request, Response, ServerReply};
///
/// let codec = JsonCodec;
/// assert_eq!(codec.decode_request(br#""UP""#), Request::Up);
///
/// let bytes = codec.encode_reply(&ServerReply::Status(Response::Ok)).unwrap();
/// assert_eq!(bytes, br#""OK""#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode_reply(&self, reply: &ServerReply) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(reply).map_err(ProtocolError::Encode)
    }

    fn decode_request(&self, data: &[u8]) -> Request {
        serde_json::from_slice(data).unwrap_or(Request::Unknown)
    }

    fn encode_request(&self, request: Request) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(&request).map_err(ProtocolError::Encode)
    }

    fn decode_reply(&self, data: &[u8]) -> ServerReply {
        serde_json::from_slice(data)
            .unwrap_or(ServerReply::Status(crate::Response::Unknown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlayerDetails, Response};

    const DETAILS: PlayerDetails = PlayerDetails {
        row: 3,
        col: 3,
        height: 7,
        width: 7,
    };

    // =======================================================================
    // TextCodec
    // =======================================================================

    #[test]
    fn test_text_decode_request_known_token() {
        assert_eq!(TextCodec.decode_request(b"LEFT"), Request::Left);
        assert_eq!(
            TextCodec.decode_request(b"SEND_PLAYER_DETAILS"),
            Request::QueryPlayerDetails
        );
    }

    #[test]
    fn test_text_decode_request_invalid_utf8_is_unknown() {
        assert_eq!(TextCodec.decode_request(&[0xff, 0xfe]), Request::Unknown);
    }

    #[test]
    fn test_text_decode_request_does_not_trim() {
        assert_eq!(TextCodec.decode_request(b"UP "), Request::Unknown);
    }

    #[test]
    fn test_text_encode_reply_status_and_details() {
        let status = TextCodec
            .encode_reply(&ServerReply::Status(Response::WallCollision))
            .unwrap();
        assert_eq!(status, b"WALL_COLLISION");

        let details = TextCodec
            .encode_reply(&ServerReply::Details(DETAILS))
            .unwrap();
        assert_eq!(details, b"3 3 7 7");
    }

    #[test]
    fn test_text_client_side_helpers() {
        assert_eq!(TextCodec.encode_request(Request::Stop).unwrap(), b"STOP");
        assert_eq!(
            TextCodec.decode_reply(b"3 3 7 7"),
            ServerReply::Details(DETAILS)
        );
        assert_eq!(
            TextCodec.decode_reply(b"GAME_STARTED"),
            ServerReply::Status(Response::GameStarted)
        );
    }

    // =======================================================================
    // JsonCodec
    // =======================================================================

    #[cfg(feature = "json")]
    #[test]
    fn test_json_decode_request_string_token() {
        assert_eq!(JsonCodec.decode_request(br#""START""#), Request::Start);
        assert_eq!(
            JsonCodec.decode_request(br#""SEND_PLAYER_DETAILS""#),
            Request::QueryPlayerDetails
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_decode_request_malformed_is_unknown() {
        assert_eq!(JsonCodec.decode_request(br#""FLY""#), Request::Unknown);
        assert_eq!(JsonCodec.decode_request(b"START"), Request::Unknown);
        assert_eq!(JsonCodec.decode_request(b"{not json"), Request::Unknown);
        assert_eq!(JsonCodec.decode_request(b"42"), Request::Unknown);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_encode_reply_details_is_object() {
        let bytes = JsonCodec
            .encode_reply(&ServerReply::Details(DETAILS))
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["row"], 3);
        assert_eq!(value["width"], 7);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_decode_reply_both_shapes() {
        assert_eq!(
            JsonCodec.decode_reply(br#""GAME_OVER""#),
            ServerReply::Status(Response::GameOver)
        );
        assert_eq!(
            JsonCodec.decode_reply(br#"{"row":3,"col":3,"height":7,"width":7}"#),
            ServerReply::Details(DETAILS)
        );
        assert_eq!(
            JsonCodec.decode_reply(b"nonsense"),
            ServerReply::Status(Response::Unknown)
        );
    }
}
