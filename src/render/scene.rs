//! Visual tree of the collage
//!
//! The scene is what a capture sees: the container, one tile per item with
//! its image content, and the interactive chrome (handles, controls, badges)
//! that must not end up in an export.

use crate::domain::{PixelRect, Point, ResourceHandle};

/// Element kind of a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTag {
    Container,
    Div,
    Img,
    Span,
    Button,
    Input,
    Select,
}

/// Image content drawn inside a node's box
#[derive(Debug, Clone, PartialEq)]
pub struct ImageContent {
    pub resource: ResourceHandle,
    pub alt: String,
    pub scale: f32,
    pub pan: Point,
}

/// What a node paints
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    None,
    /// Solid RGBA fill of the node's box
    Fill([u8; 4]),
    /// Cover-fitted image, transformed and clipped to the node's box
    Image(ImageContent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub tag: NodeTag,
    pub classes: Vec<String>,
    /// Box relative to the container's top-left corner
    pub rect: PixelRect,
    pub content: NodeContent,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(tag: NodeTag, rect: PixelRect) -> Self {
        Self {
            tag,
            classes: Vec::new(),
            rect,
            content: NodeContent::None,
            children: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_content(mut self, content: NodeContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Visit every node in paint order, skipping excluded subtrees
    pub fn visit<'a>(&'a self, filter: &ExclusionFilter, f: &mut impl FnMut(&'a SceneNode)) {
        if filter.excludes(self) {
            return;
        }
        f(self);
        for child in &self.children {
            child.visit(filter, f);
        }
    }

    /// Image resources referenced by nodes that survive `filter`
    pub fn resources(&self, filter: &ExclusionFilter) -> Vec<ResourceHandle> {
        let mut out: Vec<ResourceHandle> = Vec::new();
        self.visit(filter, &mut |node| {
            if let NodeContent::Image(image) = &node.content
                && !out.contains(&image.resource)
            {
                out.push(image.resource.clone());
            }
        });
        out
    }
}

/// Predicate deciding which nodes stay out of a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionFilter {
    pub classes: Vec<String>,
    pub tags: Vec<NodeTag>,
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self {
            classes: ["drag-handle", "resize-handle", "handle", "export-hide", "controls", "icon"]
                .into_iter()
                .map(String::from)
                .collect(),
            tags: vec![NodeTag::Button, NodeTag::Input, NodeTag::Select],
        }
    }
}

impl ExclusionFilter {
    /// Whether `node` (and with it its whole subtree) is skipped
    pub fn excludes(&self, node: &SceneNode) -> bool {
        self.tags.contains(&node.tag) || self.classes.iter().any(|class| node.has_class(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> PixelRect {
        PixelRect::new(0.0, 0.0, 10.0, 10.0)
    }

    fn image(url: &str) -> NodeContent {
        NodeContent::Image(ImageContent {
            resource: ResourceHandle::new(url),
            alt: String::new(),
            scale: 1.0,
            pan: Point::ORIGIN,
        })
    }

    #[test]
    fn class_match_is_per_token() {
        let filter = ExclusionFilter::default();
        let icon = SceneNode::new(NodeTag::Span, rect()).with_class("icon");
        let iconic = SceneNode::new(NodeTag::Span, rect()).with_class("iconic-photo");
        assert!(filter.excludes(&icon));
        assert!(!filter.excludes(&iconic));
        assert!(filter.excludes(&SceneNode::new(NodeTag::Button, rect())));
    }

    #[test]
    fn excluded_subtree_is_skipped() {
        let tree = SceneNode::new(NodeTag::Container, rect())
            .with_child(SceneNode::new(NodeTag::Img, rect()).with_content(image("a")))
            .with_child(
                SceneNode::new(NodeTag::Div, rect())
                    .with_class("controls")
                    .with_child(SceneNode::new(NodeTag::Img, rect()).with_content(image("b"))),
            )
            .with_child(SceneNode::new(NodeTag::Img, rect()).with_content(image("a")));

        let resources = tree.resources(&ExclusionFilter::default());
        assert_eq!(resources, vec![ResourceHandle::new("a")]);

        let mut visited = 0;
        tree.visit(&ExclusionFilter::default(), &mut |_| visited += 1);
        assert_eq!(visited, 3);
    }
}
