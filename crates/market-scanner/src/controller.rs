use crate::state::{ScanState, ScanStateError, ScanStatus, SharedScanState, StartMode};

/// Control surface over the shared scan state, for request handlers and the
/// agent binary.
#[derive(Clone)]
pub struct ScanController {
    state: SharedScanState,
}

impl ScanController {
    pub fn new(state: SharedScanState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &SharedScanState {
        &self.state
    }

    pub async fn start(&self, universe: Vec<String>) -> Result<StartMode, ScanStateError> {
        let mode = self.state.write().await.start(universe)?;
        tracing::info!("Scan {:?}", mode);
        Ok(mode)
    }

    /// Pausing a scan that is not running is a no-op.
    pub async fn pause(&self) -> bool {
        match self.state.write().await.pause() {
            Ok(()) => {
                tracing::info!("Scan pause requested");
                true
            }
            Err(_) => false,
        }
    }

    pub async fn status(&self) -> ScanStatus {
        self.state.read().await.status()
    }

    pub async fn reset(&self) -> Result<(), ScanStateError> {
        self.state.write().await.reset()?;
        tracing::info!("Scan state reset");
        Ok(())
    }

    pub async fn is_active(&self) -> bool {
        self.state.read().await.is_active()
    }

    pub async fn is_completed(&self) -> bool {
        self.state.read().await.is_completed()
    }
}

impl Default for ScanController {
    fn default() -> Self {
        Self::new(ScanState::new().shared())
    }
}
