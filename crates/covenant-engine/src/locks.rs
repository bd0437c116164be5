use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per contract id. Entries are created on first use and
/// kept for the life of the map.
#[derive(Default)]
pub(crate) struct ContractLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ContractLocks {
    pub(crate) async fn acquire(&self, contract_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inner = self.inner.lock().await;
            Arc::clone(inner.entry(contract_id).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_contract_contends() {
        let locks = ContractLocks::default();
        let id = Uuid::new_v4();
        let _held = locks.acquire(id).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(id)).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn different_contracts_do_not_contend() {
        let locks = ContractLocks::default();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(Uuid::new_v4())).await;
        assert!(b.is_ok());
    }
}
