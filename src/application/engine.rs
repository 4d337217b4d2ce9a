use super::catalog::Catalog;
use super::reconciler::Reconciler;
use super::review::ReviewDesk;
use super::selector::Selector;
use super::wallet_service::WalletService;
use crate::config::EngineConfig;
use crate::domain::ports::{LedgerStore, Notifier, PaymentGateway, TaskStore, UserDirectory};
use std::sync::Arc;

/// The engine facade: wires the services over one set of ports.
///
/// Hosts construct it once with their adapters and call the services
/// directly; the engine itself holds no state beyond the shared ports.
pub struct Engine {
    pub wallet: WalletService,
    pub reconciler: Reconciler,
    pub selector: Selector,
    pub catalog: Catalog,
    pub review: ReviewDesk,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        ledger: Arc<dyn LedgerStore>,
        tasks: Arc<dyn TaskStore>,
        users: Arc<dyn UserDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let config = Arc::new(config);
        let wallet = WalletService::new(
            config.clone(),
            ledger.clone(),
            gateway.clone(),
            notifier.clone(),
        );
        let reconciler = Reconciler::new(
            config.clone(),
            ledger.clone(),
            tasks.clone(),
            users.clone(),
            gateway,
            notifier.clone(),
        );
        let selector = Selector::new(tasks.clone(), users.clone());
        let catalog = Catalog::new(ledger, tasks.clone(), users, wallet.clone());
        let review = ReviewDesk::new(config, tasks, wallet.clone(), notifier);
        Self {
            wallet,
            reconciler,
            selector,
            catalog,
            review,
        }
    }
}
