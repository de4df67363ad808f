//! Registry configuration

/// What `push` does to a subscriber whose delivery queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Drop the new payload for that subscriber only and count the drop
    DropNewest,
    /// Close the subscriber's queue, ending its delivery task
    Disconnect,
}

/// Registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Capacity of each consumer's delivery queue
    pub queue_capacity: usize,

    /// Policy applied when a delivery queue is full
    pub overflow_policy: OverflowPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            overflow_policy: OverflowPolicy::DropNewest,
        }
    }
}

impl RegistryConfig {
    /// Set the per-consumer queue capacity (minimum 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the slow-consumer policy
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.overflow_policy, OverflowPolicy::DropNewest);
    }

    #[test]
    fn test_builder_queue_capacity() {
        let config = RegistryConfig::default().queue_capacity(8);

        assert_eq!(config.queue_capacity, 8);
    }

    #[test]
    fn test_builder_queue_capacity_floor() {
        // A zero-capacity queue could never accept a payload
        let config = RegistryConfig::default().queue_capacity(0);

        assert_eq!(config.queue_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .queue_capacity(16)
            .overflow_policy(OverflowPolicy::Disconnect);

        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.overflow_policy, OverflowPolicy::Disconnect);
    }
}
