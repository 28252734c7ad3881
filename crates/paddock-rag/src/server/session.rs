//! Per-connection question/answer loop
//!
//! A session alternates between waiting for the next question and running
//! the pipeline for it. Questions on one connection are answered strictly in
//! order; the next message is not read until the current reply is sent.

use async_trait::async_trait;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::RagPipeline;

/// Reply sent when answering a question fails
pub const APOLOGY_REPLY: &str = "Sorry, something went wrong while answering your question.";

/// What the transport delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A question to answer
    Question(String),
    /// A frame with no question in it (ping, pong, undecodable binary)
    Ignored,
    /// The peer went away
    Closed,
}

/// Bidirectional message channel to one client
#[async_trait]
pub trait QueryChannel: Send {
    /// Wait for the next inbound message
    async fn recv(&mut self) -> Inbound;

    /// Send a reply to the client
    async fn send(&mut self, reply: String) -> Result<()>;
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Questions received
    pub questions: usize,
    /// Questions answered with the apology reply
    pub failures: usize,
}

/// Serve questions on `channel` until the client disconnects
pub async fn run_session<C: QueryChannel>(channel: C, pipeline: &RagPipeline) -> SessionSummary {
    let span = tracing::info_span!("session", id = %Uuid::new_v4());
    serve(channel, pipeline).instrument(span).await
}

async fn serve<C: QueryChannel>(mut channel: C, pipeline: &RagPipeline) -> SessionSummary {
    let mut summary = SessionSummary::default();
    tracing::info!("Client connected");

    loop {
        let question = match channel.recv().await {
            Inbound::Question(question) => question,
            Inbound::Ignored => continue,
            Inbound::Closed => break,
        };
        summary.questions += 1;
        tracing::info!("Question: \"{}\"", question);

        let reply = match pipeline.answer(&question).await {
            Ok(answer) => answer,
            Err(e) => {
                summary.failures += 1;
                tracing::error!(
                    stage = e.stage(),
                    question = %question,
                    "Failed to answer: {}",
                    e
                );
                APOLOGY_REPLY.to_string()
            }
        };

        if let Err(e) = channel.send(reply).await {
            tracing::warn!("Failed to send reply, closing session: {}", e);
            break;
        }
    }

    tracing::info!(
        questions = summary.questions,
        failures = summary.failures,
        "Client disconnected"
    );
    summary
}
