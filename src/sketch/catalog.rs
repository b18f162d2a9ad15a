/// A subject the classifier was trained on, shown as a drawing prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawableItem {
    pub name: &'static str,
    pub description: &'static str,
}

pub static DRAWABLE_ITEMS: [DrawableItem; 10] = [
    DrawableItem { name: "Bird", description: "Any flying bird" },
    DrawableItem { name: "Car", description: "Side view of a car" },
    DrawableItem { name: "Cat", description: "A cat face or body" },
    DrawableItem { name: "Clock", description: "An analog clock" },
    DrawableItem { name: "Dog", description: "A dog face or body" },
    DrawableItem { name: "Face", description: "A human face" },
    DrawableItem { name: "Fish", description: "Any swimming fish" },
    DrawableItem { name: "House", description: "Simple house with roof" },
    DrawableItem { name: "Sun", description: "The sun, can include rays" },
    DrawableItem { name: "Tree", description: "Any type of tree" },
];

pub fn find_item(name: &str) -> Option<&'static DrawableItem> {
    DRAWABLE_ITEMS
        .iter()
        .find(|item| item.name.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_are_alphabetical_and_unique() {
        let names: Vec<&str> = DRAWABLE_ITEMS.iter().map(|item| item.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(find_item(" house ").map(|i| i.description), Some("Simple house with roof"));
        assert!(find_item("giraffe").is_none());
    }
}
