use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::address::Address;
use crate::models::value::EncodedValue;
use crate::services::decoder::FromState;

/// Read-only access to committed on-chain state.
#[async_trait]
pub trait StateService: Send + Sync {
    /// `Ok(None)` means nothing is stored at the address.
    async fn get_state(&self, address: &Address) -> Result<Option<EncodedValue>>;
}

/// Fetches and decodes state that must exist.
pub async fn fetch_required<T: FromState>(
    state: &dyn StateService,
    address: &Address,
    role: &str,
) -> Result<T> {
    let context = format!("{} {}", role, address);
    tracing::debug!("Fetching required {} at {}", role, address);
    match state.get_state(address).await? {
        Some(value) => T::from_state(&value, &context),
        None => Err(AppError::MissingRequiredState(context)),
    }
}

/// Fetches optional state. Absence yields `default()`; a present value must still decode.
pub async fn fetch_optional_or_default<T, F>(
    state: &dyn StateService,
    address: &Address,
    role: &str,
    default: F,
) -> Result<T>
where
    T: FromState,
    F: FnOnce() -> T,
{
    let context = format!("{} {}", role, address);
    tracing::debug!("Fetching optional {} at {}", role, address);
    match state.get_state(address).await? {
        Some(value) => T::from_state(&value, &context),
        None => {
            tracing::debug!("No {} stored at {}; using empty value", role, address);
            Ok(default())
        }
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-memory state for tests. Addresses in `failing` return a service error;
    /// fetches of addresses in `stalled` never complete.
    #[derive(Default)]
    pub(crate) struct MemoryStateService {
        states: Mutex<HashMap<Address, EncodedValue>>,
        failing: Mutex<HashSet<Address>>,
        stalled: Mutex<HashSet<Address>>,
        fetches: AtomicUsize,
    }

    impl MemoryStateService {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn insert(&self, address: Address, value: EncodedValue) {
            self.states.lock().unwrap().insert(address, value);
        }

        pub(crate) fn fail_on(&self, address: Address) {
            self.failing.lock().unwrap().insert(address);
        }

        pub(crate) fn stall_on(&self, address: Address) {
            self.stalled.lock().unwrap().insert(address);
        }

        pub(crate) fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StateService for MemoryStateService {
        async fn get_state(&self, address: &Address) -> Result<Option<EncodedValue>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let stalled = self.stalled.lock().unwrap().contains(address);
            if stalled {
                std::future::pending::<()>().await;
            }
            if self.failing.lock().unwrap().contains(address) {
                return Err(AppError::StateService(format!("unavailable: {}", address)));
            }
            Ok(self.states.lock().unwrap().get(address).cloned())
        }
    }
}
