//! Session - the estimator handles and config of one puppet process
//!
//! Built once at startup and passed by reference into every cycle, so
//! several characters can run in one process without shared globals.

use puppet_core::PuppetResult;
use puppet_skin::{Illustration, VectorAsset};
use tracing::info;

use crate::{FaceOracle, PoseOracle, RuntimeConfig};

pub struct Session<P, F> {
    pub pose: P,
    pub face: F,
    pub config: RuntimeConfig,
}

impl<P: PoseOracle, F: FaceOracle> Session<P, F> {
    pub fn new(pose: P, face: F, config: RuntimeConfig) -> Self {
        Session { pose, face, config }
    }

    /// Bind a character asset with this session's skeleton and bind config
    pub fn bind(&self, asset: &VectorAsset) -> PuppetResult<Illustration> {
        let illustration =
            Illustration::bind(asset, self.config.skeleton.clone(), &self.config.bind)?;
        info!(
            bones = illustration.skeleton().bones().len(),
            paths = illustration.paths().len(),
            "character ready"
        );
        Ok(illustration)
    }
}
