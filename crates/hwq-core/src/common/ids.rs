use crate::define_id_type;

define_id_type!(JobId, u64);
define_id_type!(SessionId, u64);
define_id_type!(ProjectId, u64);
define_id_type!(QuotaId, u64);
define_id_type!(CommentId, u64);

#[derive(Copy, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct IdCounter {
    counter: u64,
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl IdCounter {
    pub fn new(initial_value: u64) -> Self {
        Self {
            counter: initial_value,
        }
    }

    pub fn increment(&mut self) -> u64 {
        let value = self.counter;
        self.counter += 1;
        value
    }
}
