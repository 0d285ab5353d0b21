//! Waiter engine: polls an operation until an acceptor matches or the
//! deadline passes.

use std::future::Future;
use std::time::{Duration, Instant};

use serde_json::Value;
use smithy_mcp_common::{
    Acceptor, AcceptorState, Comparator, Result, SmithyMcpError, WaiterConfig,
};

/// Terminal outcome of a waiter run. Timeouts surface as
/// [`SmithyMcpError::WaiterTimeout`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct WaiterOutcome {
    pub state: AcceptorState,
    pub attempts: u32,
    pub result: Value,
}

/// Poll `poll` until an acceptor transitions the waiter into success or
/// failure. Acceptors are evaluated in declared order and the first match
/// wins; a response matching no acceptor keeps the waiter polling. Poll
/// errors are swallowed until the deadline. The delay between attempts
/// starts at the waiter's minimum and grows by half each attempt, capped at
/// the waiter's maximum.
pub async fn run_waiter<F, Fut>(
    waiter: &WaiterConfig,
    max_wait: Duration,
    mut poll: F,
) -> Result<WaiterOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let started = Instant::now();
    let max_delay = Duration::from_secs(waiter.max_delay);
    let mut delay = Duration::from_secs(waiter.min_delay);
    let mut attempts: u32 = 0;
    let mut last_error = "condition not met".to_string();

    loop {
        attempts += 1;
        match poll().await {
            Ok(result) => match check_acceptors(&waiter.acceptors, &result) {
                Some(state @ (AcceptorState::Success | AcceptorState::Failure)) => {
                    return Ok(WaiterOutcome {
                        state,
                        attempts,
                        result,
                    });
                }
                _ => {}
            },
            Err(e) => {
                last_error = e.to_string();
                if started.elapsed() > max_wait {
                    return Err(SmithyMcpError::WaiterTimeout {
                        attempts,
                        last_error,
                    });
                }
            }
        }

        if started.elapsed() > max_wait {
            return Err(SmithyMcpError::WaiterTimeout {
                attempts,
                last_error,
            });
        }

        tokio::time::sleep(delay).await;
        delay = next_delay(delay, max_delay);
    }
}

/// Backoff step: grow by half, capped at the waiter maximum.
pub fn next_delay(current: Duration, max: Duration) -> Duration {
    (current + current / 2).min(max)
}

/// Evaluate acceptors in order against a response; first match wins.
pub fn check_acceptors(acceptors: &[Acceptor], result: &Value) -> Option<AcceptorState> {
    acceptors
        .iter()
        .find(|acceptor| acceptor_matches(acceptor, result))
        .map(|acceptor| acceptor.state)
}

fn acceptor_matches(acceptor: &Acceptor, result: &Value) -> bool {
    let Some(value) = extract_path(result, &acceptor.path) else {
        return false;
    };
    let expected = acceptor.expected.as_str();
    match acceptor.comparator {
        Comparator::StringEquals => value.as_str() == Some(expected),
        Comparator::BooleanEquals => match expected.parse::<bool>() {
            Ok(expected) => value.as_bool() == Some(expected),
            Err(_) => false,
        },
        Comparator::AllStringEquals => value
            .as_array()
            .is_some_and(|items| items.iter().all(|v| v.as_str() == Some(expected))),
        Comparator::AnyStringEquals => value
            .as_array()
            .is_some_and(|items| items.iter().any(|v| v.as_str() == Some(expected))),
    }
}

/// Walk a dotted path through a response, short-circuiting to `None` on any
/// null or missing segment.
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        if current.is_null() {
            return None;
        }
        current = current.get(part)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}
