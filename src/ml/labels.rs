//! Class names for the Fashion-MNIST label indices.

/// Display names indexed by class id.
pub const FASHION_LABELS: [&str; 10] = [
    "T-shirt/top",
    "Trousers",
    "Pullover",
    "Dress",
    "Coat",
    "Sandals",
    "Shirt",
    "Sneakers",
    "Bag",
    "Ankle boots",
];

pub fn label_for(index: usize) -> Option<&'static str> {
    FASHION_LABELS.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_indices_and_rejects_others() {
        assert_eq!(label_for(0), Some("T-shirt/top"));
        assert_eq!(label_for(9), Some("Ankle boots"));
        assert_eq!(label_for(10), None);
    }
}
