use std::io;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{clock::VectorClock, item::Item};

const LINE_ENDINGS: &[char] = &['\n', '\r'];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Write {
        item_id: String,
        content: String,
        client_id: String,
    },
    Read {
        item_id: String,
        /// Routing hint from the client; servers do not enforce it.
        #[serde(default)]
        preferred_node: Option<String>,
        #[serde(default)]
        min_clock: Option<VectorClock>,
    },
    Replicate {
        item: Item,
        sender_node_id: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteReply {
    pub item_id: String,
    pub node_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadReply {
    pub item: Item,
    pub node_id: String,
    /// Set when the local clock did not cover the client's baseline.
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Written(WriteReply),
    Read(ReadReply),
    Ack,
    NotFound { item_id: String },
    Error { message: String },
}

pub async fn read_message<R, T>(reader: &mut R) -> io::Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    // One JSON document per line.
    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader.read_line(&mut line).await?;
        if bytes == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(LINE_ENDINGS);
        if trimmed.is_empty() {
            continue;
        }

        let parsed = serde_json::from_str(trimmed).map_err(to_io_error)?;
        return Ok(Some(parsed));
    }
}

pub async fn write_message<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut encoded = serde_json::to_vec(message).map_err(to_io_error)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

fn to_io_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replicate_request_survives_the_wire() {
        let (mut writer, reader) = tokio::io::duplex(1024);
        let mut reader = tokio::io::BufReader::new(reader);
        let request = Request::Replicate {
            item: Item {
                id: "review-1".into(),
                content: "tasty".into(),
                clock: [("A", 2), ("B", 1)].into_iter().collect(),
                timestamp: 42,
            },
            sender_node_id: "A".into(),
        };

        write_message(&mut writer, &request)
            .await
            .expect("write message");
        let parsed = read_message::<_, Request>(&mut reader)
            .await
            .expect("read message")
            .expect("expected message");

        assert_eq!(request, parsed);
    }

    #[test]
    fn clock_is_encoded_as_plain_map() {
        let json = serde_json::to_value(Response::Read(ReadReply {
            item: Item {
                id: "review-1".into(),
                content: "ok".into(),
                clock: [("A", 1)].into_iter().collect(),
                timestamp: 7,
            },
            node_id: "A".into(),
            stale: false,
        }))
        .expect("serialize");

        assert_eq!(json["type"], "read");
        assert_eq!(json["item"]["clock"]["A"], 1);
    }

    #[test]
    fn read_request_without_hints_parses() {
        let parsed: Request =
            serde_json::from_str(r#"{"type":"read","item_id":"review-1"}"#).expect("parse");
        assert_eq!(
            parsed,
            Request::Read {
                item_id: "review-1".into(),
                preferred_node: None,
                min_clock: None,
            }
        );
    }
}
