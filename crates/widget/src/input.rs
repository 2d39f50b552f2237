use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Reads the next submission line from `reader`, decoding it lossily.
///
/// Bytes that are not valid UTF-8 become U+FFFD instead of failing the read.
/// `buffer` carries a partially read line across calls, so a caller that drops
/// the future midway (for example inside `tokio::select!`) loses nothing.
/// Returns `None` at end of input.
pub async fn next_input_line<R>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    reader.read_until(b'\n', buffer).await?;
    if buffer.is_empty() {
        return Ok(None);
    }

    let mut bytes = std::mem::take(buffer);
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
    }

    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}
