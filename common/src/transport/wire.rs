use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Frames a client sends to the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayRequest {
    Subscribe { topic: String },
    Publish { topic: String, payload: String },
}

/// Frames the relay sends to a subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    Delivery { topic: String, payload: String },
}

/// Reads the next decodable frame off a line-delimited JSON stream. Blank
/// and undecodable lines are dropped, not treated as stream failures; `None`
/// means the stream ended.
pub async fn read_frame<R, T>(reader: &mut R) -> io::Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str(trimmed) {
            Ok(frame) => return Ok(Some(frame)),
            Err(e) => {
                crate::log!("Dropping undecodable frame: {}", e);
                continue;
            }
        }
    }
}

pub async fn write_frame<W, T>(writer: &mut W, frame: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut encoded = serde_json::to_vec(frame)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_frame_round_trip() {
        let (mut writer, reader) = tokio::io::duplex(1024);
        let mut reader = BufReader::new(reader);
        let frame = RelayRequest::Publish {
            topic: "tictactoe-AAAAA".to_string(),
            payload: r#"{"sender":"abc","type":"restart"}"#.to_string(),
        };

        write_frame(&mut writer, &frame).await.unwrap();
        let decoded: RelayRequest = read_frame(&mut reader).await.unwrap().unwrap();

        assert_eq!(frame, decoded);
    }

    #[tokio::test]
    async fn test_undecodable_lines_are_skipped() {
        let (mut writer, reader) = tokio::io::duplex(1024);
        let mut reader = BufReader::new(reader);

        writer.write_all(b"\n{malformed}\n").await.unwrap();
        write_frame(
            &mut writer,
            &RelayRequest::Subscribe {
                topic: "tictactoe-AAAAA".to_string(),
            },
        )
        .await
        .unwrap();

        let decoded: RelayRequest = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(
            decoded,
            RelayRequest::Subscribe {
                topic: "tictactoe-AAAAA".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_end_of_stream_returns_none() {
        let (writer, reader) = tokio::io::duplex(1024);
        let mut reader = BufReader::new(reader);
        drop(writer);

        let frame: Option<RelayRequest> = read_frame(&mut reader).await.unwrap();
        assert!(frame.is_none());
    }
}
