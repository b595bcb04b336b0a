use crate::credentials;

impl credentials::Model {
    pub fn validated_issued_at_block(&self) -> u64 {
        self.issued_at_block.max(0) as u64
    }

    pub fn validated_revoked_at_block(&self) -> Option<u64> {
        self.revoked_at_block.map(|block| block.max(0) as u64)
    }
}
