//! Class id to label lookup.

use std::borrow::Cow;

/// COCO class names (80 classes), indexed by detector class id.
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck",
    "boat", "traffic light", "fire hydrant", "stop sign", "parking meter", "bench",
    "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra",
    "giraffe", "backpack", "umbrella", "handbag", "tie", "suitcase", "frisbee",
    "skis", "snowboard", "sports ball", "kite", "baseball bat", "baseball glove",
    "skateboard", "surfboard", "tennis racket", "bottle", "wine glass", "cup",
    "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
    "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier",
    "toothbrush",
];

/// Label table for the detector's class ids.
#[derive(Debug, Clone)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    /// Create a label table from an ordered list of names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Label for a class id. Unknown ids get a synthetic `class N` label.
    pub fn label(&self, class_id: u32) -> Cow<'_, str> {
        match self.names.get(class_id as usize) {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(format!("class {}", class_id)),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ClassNames {
    fn default() -> Self {
        Self::new(COCO_CLASSES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_labels() {
        let names = ClassNames::default();
        assert_eq!(names.len(), 80);
        assert_eq!(names.label(0), "person");
        assert_eq!(names.label(2), "car");
        assert_eq!(names.label(67), "cell phone");
    }

    #[test]
    fn test_unknown_class_label() {
        let names = ClassNames::new(["a", "b"]);
        assert_eq!(names.label(1), "b");
        assert_eq!(names.label(7), "class 7");
    }
}
