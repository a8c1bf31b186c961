//! Component / instance resolution.
//!
//! An instance ("ref" node) renders as a copy of its component's subtree,
//! with per-descendant overrides merged in and slot descendants swapped for
//! the instance's replacement content. Resolution only reads the graph; the
//! template and the instance are never written.
//!
//! Descendants inside a resolved instance are given path ids
//! (`instance/descendant`) so the rendered tree stays unique even when the
//! same component is placed many times, while `source_id` keeps the
//! template id that overrides are keyed by.

use crate::error::ResolveError;
use crate::graph::FlatGraph;
use crate::id::NodeId;
use crate::layout::LayoutBox;
use crate::model::{DescendantOverride, InstanceProps, SceneNode, StrokeWidth, TreeNode};
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashSet;

/// A node in the resolved (render) tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    /// Rendered id: the stored id outside instances, a path id inside.
    pub id: NodeId,
    /// Id of the stored node or template descendant this was built from.
    pub source_id: NodeId,
    /// Effective node data. `node.id == id`.
    pub node: SceneNode,
    pub children: Vec<RenderNode>,
    /// Set on instances that could not be resolved; they render empty.
    pub error: Option<ResolveError>,
}

impl RenderNode {
    fn plain(id: NodeId, source_id: NodeId, mut node: SceneNode, children: Vec<RenderNode>) -> Self {
        node.id = id;
        Self {
            id,
            source_id,
            node,
            children,
            error: None,
        }
    }

    /// Depth-first search by rendered id.
    pub fn find(&self, id: NodeId) -> Option<&RenderNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

impl LayoutBox for RenderNode {
    fn layout_id(&self) -> NodeId {
        self.id
    }

    fn scene(&self) -> &SceneNode {
        &self.node
    }

    fn child_boxes(&self) -> &[Self] {
        &self.children
    }
}

/// The reusable frame `id` names, if any.
pub fn find_component(graph: &FlatGraph, id: NodeId) -> Option<&SceneNode> {
    graph.get(id).filter(|n| n.is_component())
}

/// Resolve every root of the document. Instances anywhere in the tree are
/// expanded; other nodes are copied as-is.
pub fn resolve_tree(graph: &FlatGraph) -> Vec<RenderNode> {
    let mut resolver = Resolver::new(graph);
    graph
        .root_ids
        .iter()
        .filter_map(|&id| resolver.stored(id))
        .collect()
}

/// Effective subtree for the instance stored at `instance_id`. `None` when
/// the id is missing or not an instance.
pub fn resolve_instance(graph: &FlatGraph, instance_id: NodeId) -> Option<RenderNode> {
    let node = graph.get(instance_id)?;
    node.instance_props()?;
    let mut resolver = Resolver::new(graph);
    Some(resolver.instance(node, instance_id, instance_id))
}

struct Resolver<'a> {
    graph: &'a FlatGraph,
    /// Components currently being expanded, outermost first.
    stack: Vec<NodeId>,
}

impl<'a> Resolver<'a> {
    fn new(graph: &'a FlatGraph) -> Self {
        Self {
            graph,
            stack: Vec::new(),
        }
    }

    /// A stored node outside any instance.
    fn stored(&mut self, id: NodeId) -> Option<RenderNode> {
        let graph = self.graph;
        let node = graph.get(id)?;
        if node.instance_props().is_some() {
            return Some(self.instance(node, id, id));
        }
        let children = graph
            .children(id)
            .iter()
            .filter_map(|&c| self.stored(c))
            .collect();
        Some(RenderNode::plain(id, id, node.clone(), children))
    }

    fn instance(&mut self, inst: &SceneNode, render_id: NodeId, source_id: NodeId) -> RenderNode {
        let Some(props) = inst.instance_props() else {
            return RenderNode::plain(render_id, source_id, inst.clone(), Vec::new());
        };
        let component_id = props.component_id;

        let fail = |error: ResolveError| {
            log::warn!("instance {render_id} renders empty: {error}");
            let mut node = inst.clone();
            node.id = render_id;
            RenderNode {
                id: render_id,
                source_id,
                node,
                children: Vec::new(),
                error: Some(error),
            }
        };

        let graph = self.graph;
        let Some(component) = find_component(graph, component_id) else {
            return fail(ResolveError::MissingComponent(component_id));
        };
        if self.stack.contains(&component_id) {
            return fail(ResolveError::ComponentCycle(component_id));
        }

        let root = instance_root(component, inst);

        self.stack.push(component_id);
        let children = graph
            .children(component_id)
            .iter()
            .filter_map(|&d| self.descendant(d, props, render_id))
            .collect();
        self.stack.pop();

        RenderNode::plain(render_id, source_id, root, children)
    }

    /// One template descendant of the instance rendered at `instance_render`.
    fn descendant(
        &mut self,
        template_id: NodeId,
        props: &InstanceProps,
        instance_render: NodeId,
    ) -> Option<RenderNode> {
        let graph = self.graph;
        let template = graph.get(template_id)?;
        let render_id = NodeId::path(instance_render, template_id);
        let over = props.descendants.get(&template_id);
        if !over.and_then(|o| o.enabled).unwrap_or(template.enabled) {
            return None;
        }

        if template.instance_props().is_some()
            && let Some(replacement) = props.slot_content.get(&template_id)
        {
            let mut node = replacement.node.clone();
            node.x = template.x;
            node.y = template.y;
            node.width = template.width;
            node.height = template.height;
            return Some(self.replacement(
                &node,
                &replacement.children,
                render_id,
                template_id,
                instance_render,
            ));
        }

        let mut node = template.clone();
        if let Some(over) = over {
            apply_override(&mut node, over);
        }

        if node.instance_props().is_some() {
            return Some(self.instance(&node, render_id, template_id));
        }

        let children = graph
            .children(template_id)
            .iter()
            .filter_map(|&c| self.descendant(c, props, instance_render))
            .collect();
        Some(RenderNode::plain(render_id, template_id, node, children))
    }

    /// Slot replacement content. It lives on the instance, not in the graph,
    /// so its children come from the tree view.
    fn replacement(
        &mut self,
        node: &SceneNode,
        children: &[TreeNode],
        render_id: NodeId,
        source_id: NodeId,
        instance_render: NodeId,
    ) -> RenderNode {
        if node.instance_props().is_some() {
            return self.instance(node, render_id, source_id);
        }
        let children = children
            .iter()
            .filter(|c| c.node.enabled)
            .map(|c| {
                let id = NodeId::path(instance_render, c.id());
                self.replacement(&c.node, &c.children, id, c.id(), instance_render)
            })
            .collect();
        RenderNode::plain(render_id, source_id, node.clone(), children)
    }
}

/// The component frame's props with the instance's own placement, size,
/// and (when set) paint. The result is a plain frame, not a component.
fn instance_root(component: &SceneNode, inst: &SceneNode) -> SceneNode {
    let mut root = component.clone();
    root.name = inst.name.clone().or(root.name);
    root.x = inst.x;
    root.y = inst.y;
    root.width = inst.width;
    root.height = inst.height;
    root.rotation = inst.rotation;
    root.flip_x = inst.flip_x;
    root.flip_y = inst.flip_y;
    root.opacity = inst.opacity;
    root.visible = inst.visible;
    root.enabled = inst.enabled;
    root.sizing = inst.sizing;
    root.absolute_position = inst.absolute_position;
    if inst.fill.is_some() {
        root.fill = inst.fill.clone();
    }
    if inst.stroke.is_some() {
        root.stroke = inst.stroke.clone();
    }
    if inst.fill_binding.is_some() {
        root.fill_binding = inst.fill_binding.clone();
    }
    if inst.stroke_binding.is_some() {
        root.stroke_binding = inst.stroke_binding.clone();
    }
    if let Some(frame) = root.frame_props_mut() {
        frame.reusable = false;
    }
    root
}

/// Shallow merge of a descendant override onto a template copy.
pub fn apply_override(node: &mut SceneNode, over: &DescendantOverride) {
    if let Some(fill) = &over.fill {
        node.fill = Some(fill.clone());
    }
    if let Some(stroke) = &over.stroke {
        node.stroke = Some(stroke.clone());
    }
    if let Some(width) = over.stroke_width
        && let Some(stroke) = node.stroke.as_mut()
    {
        stroke.width = StrokeWidth::Uniform(width);
    }
    if let Some(enabled) = over.enabled {
        node.enabled = enabled;
    }
    if let Some(binding) = &over.fill_binding {
        node.fill_binding = Some(binding.clone());
    }
    if let Some(binding) = &over.stroke_binding {
        node.stroke_binding = Some(binding.clone());
    }
}

/// Override keys on `instance_id` whose template descendant is gone from
/// the component. Sorted by id text.
pub fn stale_override_keys(graph: &FlatGraph, instance_id: NodeId) -> Vec<NodeId> {
    let Some(props) = graph.get(instance_id).and_then(SceneNode::instance_props) else {
        return Vec::new();
    };
    let live: HashSet<NodeId> = graph.descendants(props.component_id).into_iter().collect();
    let mut stale: Vec<NodeId> = props
        .descendants
        .keys()
        .chain(props.slot_content.keys())
        .filter(|k| !live.contains(k))
        .copied()
        .collect();
    stale.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    stale.dedup();
    stale
}

/// Components enclosing `id`: the node itself when it is one, then its
/// component ancestors, nearest first.
pub fn enclosing_components(graph: &FlatGraph, id: NodeId) -> Vec<NodeId> {
    std::iter::once(id)
        .chain(graph.ancestors(id))
        .filter(|&a| find_component(graph, a).is_some())
        .collect()
}

/// Component ids referenced by instances anywhere in a tree, slot content
/// included.
pub fn referenced_components(tree: &TreeNode) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_references(tree, &mut out);
    out
}

fn collect_references(tree: &TreeNode, out: &mut Vec<NodeId>) {
    collect_node_references(&tree.node, out);
    for child in &tree.children {
        collect_references(child, out);
    }
}

fn collect_node_references(node: &SceneNode, out: &mut Vec<NodeId>) {
    if let Some(props) = node.instance_props() {
        out.push(props.component_id);
        for content in props.slot_content.values() {
            collect_references(content, out);
        }
    }
}

/// Component dependency graph: an edge `A → B` means component A contains
/// (somewhere in its subtree or slot content) an instance of component B.
#[derive(Debug, Clone, Default)]
pub struct ComponentGraph {
    deps: DiGraphMap<NodeId, ()>,
}

impl ComponentGraph {
    pub fn build(graph: &FlatGraph) -> Self {
        let mut deps = DiGraphMap::new();
        for (&id, node) in &graph.nodes_by_id {
            if node.is_component() {
                deps.add_node(id);
            }
        }
        for (&id, node) in &graph.nodes_by_id {
            if node.instance_props().is_none() {
                continue;
            }
            let hosts = enclosing_components(graph, id);
            if hosts.is_empty() {
                continue;
            }
            let mut referenced = Vec::new();
            collect_node_references(node, &mut referenced);
            for &host in &hosts {
                for &target in &referenced {
                    deps.add_edge(host, target, ());
                }
            }
        }
        Self { deps }
    }

    /// Whether component `host` (transitively) contains an instance of
    /// `component`.
    pub fn depends_on(&self, host: NodeId, component: NodeId) -> bool {
        self.deps.contains_node(host)
            && self.deps.contains_node(component)
            && has_path_connecting(&self.deps, host, component, None)
    }

    /// Placing an instance of `component` inside component `host` would make
    /// a component contain itself.
    pub fn would_create_cycle(&self, host: NodeId, component: NodeId) -> bool {
        host == component || self.depends_on(component, host)
    }

    /// Check placing `tree` under `parent`: no instance in it may reference
    /// a component enclosing `parent`, directly or transitively.
    pub fn placement_cycle(
        &self,
        graph: &FlatGraph,
        tree: &TreeNode,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let parent = parent?;
        let hosts = enclosing_components(graph, parent);
        if hosts.is_empty() {
            return None;
        }
        referenced_components(tree)
            .into_iter()
            .find(|&target| hosts.iter().any(|&host| self.would_create_cycle(host, target)))
    }
}
