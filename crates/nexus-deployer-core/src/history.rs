use crate::domain::DeployedContract;

/// In-memory record of contracts deployed this session, newest first.
#[derive(Debug, Clone, Default)]
pub struct DeploymentHistory {
    entries: Vec<DeployedContract>,
}

impl DeploymentHistory {
    pub fn record(&mut self, entry: DeployedContract) {
        self.entries.insert(0, entry);
    }

    pub fn entries(&self) -> &[DeployedContract] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&DeployedContract> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
