use crate::domain::model::ProcessEvent;
use crate::domain::ports::EventSink;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Posts worker events to whoever holds the matching receiver.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<ProcessEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiver<ProcessEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ProcessEvent) {
        // Receiver gone means nobody is rendering anymore; dropping the event is fine.
        let _ = self.tx.send(event);
    }
}
