use std::sync::mpsc;

/// Events the engine emits while a session runs. Stop events are pushed
/// onto the session's channel during a stepping verb and observed by the
/// host only after the verb has returned, so listeners registered after the
/// call never miss one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A `continue` reached a statement with a matching breakpoint
    StoppedOnBreakpoint,
    /// A step verb reached its stop condition
    StoppedOnStep,
    /// The session stopped on the program's first statement
    StoppedOnEntry,
    /// The VM terminated; the result is delivered to the finished callback
    End,
    /// A line of emulator debug-log output
    Output(String),
}

/// Sending half of a session's event queue. Cloned into the emulator's log
/// sink so emulator output interleaves with stop events in emission order.
#[derive(Debug, Clone)]
pub(crate) struct EventSender(mpsc::Sender<Event>);

impl EventSender {
    /// Queue an event for the host. A host that has dropped its receiver
    /// simply stops observing events; that is not an engine error.
    pub fn send(&self, event: Event) {
        let _ = self.0.send(event);
    }
}

/// Create the event queue for one session
pub(crate) fn event_channel() -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel();
    (EventSender(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_emission_order() {
        let (tx, rx) = event_channel();
        tx.send(Event::Output("a".to_string()));
        tx.send(Event::StoppedOnStep);
        tx.send(Event::End);

        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                Event::Output("a".to_string()),
                Event::StoppedOnStep,
                Event::End
            ]
        );
    }

    #[test]
    fn send_survives_dropped_receiver() {
        let (tx, rx) = event_channel();
        drop(rx);
        tx.send(Event::End);
    }
}
