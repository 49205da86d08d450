//! Mode-equivalence harness.

use crate::cancellation::CancellationToken;
use crate::errors::CascadeError;
use crate::events::{EventStream, PipelineEvent};
use crate::pipeline::Pipeline;
use futures::StreamExt;

/// Drains a stream and returns its terminal event.
///
/// # Errors
///
/// Propagates the stream's terminal error, or reports an
/// [`CascadeError::InvariantViolation`] if the stream ended without one.
pub async fn terminal_of_stream(mut stream: EventStream) -> Result<PipelineEvent, CascadeError> {
    let mut last = None;
    while let Some(item) = stream.next().await {
        last = Some(item?);
    }
    last.ok_or_else(|| {
        CascadeError::InvariantViolation("stream ended without a terminal event".to_owned())
    })
}

/// Runs `pipeline` once in each mode and verifies the terminal payloads are
/// byte-identical.
///
/// # Errors
///
/// Returns [`CascadeError::InvariantViolation`] on a mismatch, or the first
/// error either run produced.
pub async fn assert_mode_equivalence(
    pipeline: &Pipeline,
    request: &str,
) -> Result<(), CascadeError> {
    let streamed =
        terminal_of_stream(pipeline.execute_streaming(request, CancellationToken::new())).await?;
    let eager = pipeline
        .execute_eager(request, CancellationToken::new())
        .await?;

    if streamed.data != eager.data || streamed.kind != eager.kind {
        return Err(CascadeError::InvariantViolation(format!(
            "modes disagree for request {request:?}: streaming produced {streamed:?}, eager produced {eager:?}"
        )));
    }
    Ok(())
}
