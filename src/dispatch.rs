use std::collections::HashMap;

use rayon::prelude::*;

use crate::machine::Predictor;
use crate::render::render_reply;
use crate::session::{SessionId, SessionStore};
use crate::telegram::{InboundEvent, OutboundMessage};

struct SessionQueue {
    session_id: SessionId,
    chat_id: i64,
    texts: Vec<String>,
}

/// Runs one polled batch through the predictor. Events for one session stay in
/// delivery order on a single worker; different sessions run in parallel.
/// Output is grouped per session, in order of each session's first event.
pub fn dispatch_batch<S: SessionStore>(
    predictor: &Predictor<S>,
    events: Vec<InboundEvent>,
    pool: Option<&rayon::ThreadPool>,
) -> Vec<OutboundMessage> {
    let queues = group_by_session(events);
    let run = || {
        queues
            .par_iter()
            .map(|queue| run_queue(predictor, queue))
            .collect::<Vec<_>>()
    };
    let per_session = match pool {
        Some(pool) => pool.install(run),
        None => run(),
    };
    per_session.into_iter().flatten().collect()
}

pub fn build_dispatch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|idx| format!("dispatch-{idx}"))
        .build()
        .ok()
}

fn group_by_session(events: Vec<InboundEvent>) -> Vec<SessionQueue> {
    let mut queues: Vec<SessionQueue> = Vec::new();
    let mut index: HashMap<SessionId, usize> = HashMap::new();
    for event in events {
        match index.get(&event.session_id) {
            Some(&idx) => queues[idx].texts.push(event.text),
            None => {
                index.insert(event.session_id.clone(), queues.len());
                queues.push(SessionQueue {
                    session_id: event.session_id,
                    chat_id: event.chat_id,
                    texts: vec![event.text],
                });
            }
        }
    }
    queues
}

fn run_queue<S: SessionStore>(
    predictor: &Predictor<S>,
    queue: &SessionQueue,
) -> Vec<OutboundMessage> {
    queue
        .texts
        .iter()
        .flat_map(|text| predictor.handle_text(&queue.session_id, text))
        .map(|reply| OutboundMessage {
            chat_id: queue.chat_id,
            outbound: render_reply(&reply),
        })
        .collect()
}
