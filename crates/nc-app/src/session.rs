//! The editing session: single owner of all mutable state.
//!
//! View layers hold a `&mut Session`, call its operations and subscribe to
//! [`SessionEvent`]s instead of reaching into the graph directly.

use std::sync::Arc;

use nc_blocks::{BlockRegistry, Params};
use nc_core::{EdgeId, NodeId, Position, SuperBlockId};
use nc_graph::{ArchitectureGraph, Deleted, EdgeInstance, GroupingManager, SuperBlock};
use nc_project::{GraphMetadata, LoadReport, SerializedGraph};
use tracing::{debug, warn};

use crate::codegen::{CodeGenerator, Framework, GenerateRequest, GenerateResponse, LineRange, NodeMapping, Provider};
use crate::config::SessionConfig;
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, Listener, SessionEvent, SubscriptionId};
use crate::export::{ExportFormat, ExportedFile};
use crate::history::HistoryManager;

#[derive(Debug)]
pub struct Session {
    graph: ArchitectureGraph,
    history: HistoryManager,
    groups: GroupingManager,
    config: SessionConfig,
    generated_code: String,
    node_mapping: NodeMapping,
    highlighted: Option<NodeId>,
    is_generating: bool,
    events: EventBus,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_registry(BlockRegistry::shared(), config)
    }

    pub fn with_registry(registry: Arc<BlockRegistry>, config: SessionConfig) -> Self {
        Self {
            graph: ArchitectureGraph::new(registry),
            history: HistoryManager::new(config.history_depth),
            groups: GroupingManager::new(),
            config,
            generated_code: String::new(),
            node_mapping: NodeMapping::new(),
            highlighted: None,
            is_generating: false,
            events: EventBus::default(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn graph(&self) -> &ArchitectureGraph {
        &self.graph
    }

    pub fn registry(&self) -> &BlockRegistry {
        self.graph.registry()
    }

    pub fn groups(&self) -> &GroupingManager {
        &self.groups
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn framework(&self) -> Framework {
        self.config.framework
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    pub fn set_framework(&mut self, framework: Framework) {
        self.config.framework = framework;
        self.events.emit(SessionEvent::SettingsChanged);
    }

    pub fn set_provider(&mut self, provider: Provider) {
        self.config.provider = provider;
        self.events.emit(SessionEvent::SettingsChanged);
    }

    pub fn generated_code(&self) -> &str {
        &self.generated_code
    }

    pub fn node_mapping(&self) -> &NodeMapping {
        &self.node_mapping
    }

    pub fn is_generating(&self) -> bool {
        self.is_generating
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Graph edits (callers snapshot first where the edit is undoable)
    // ------------------------------------------------------------------

    pub fn add_node(&mut self, type_name: &str, position: Position) -> AppResult<NodeId> {
        let id = self.graph.add_node(type_name, position)?;
        self.events.emit(SessionEvent::NodeAdded(id.clone()));
        Ok(id)
    }

    pub fn update_node_params(&mut self, id: &NodeId, partial: Params) -> AppResult<()> {
        self.graph.update_node_params(id, partial)?;
        self.events.emit(SessionEvent::NodeChanged(id.clone()));
        Ok(())
    }

    pub fn rename_node(&mut self, id: &NodeId, label: impl Into<String>) -> AppResult<()> {
        self.graph.rename_node(id, label)?;
        self.events.emit(SessionEvent::NodeChanged(id.clone()));
        Ok(())
    }

    pub fn move_node(&mut self, id: &NodeId, position: Position) -> AppResult<()> {
        self.graph.move_node(id, position)?;
        self.events.emit(SessionEvent::NodeChanged(id.clone()));
        Ok(())
    }

    /// Delete a node and its edges. Group memberships are left as they are.
    pub fn delete_node(&mut self, id: &NodeId) -> AppResult<Vec<EdgeInstance>> {
        let removed = self.graph.delete_node(id)?;
        if self.highlighted.as_ref() == Some(id) {
            self.highlighted = None;
        }
        self.emit_node_deleted(id, &removed);
        Ok(removed)
    }

    pub fn connect(
        &mut self,
        source: &NodeId,
        source_port: &str,
        target: &NodeId,
        target_port: &str,
    ) -> AppResult<EdgeInstance> {
        let edge = self.graph.connect(source, source_port, target, target_port)?;
        self.events.emit(SessionEvent::EdgeAdded {
            edge: edge.id.clone(),
            valid: edge.is_valid(),
        });
        Ok(edge)
    }

    pub fn delete_edge(&mut self, id: &EdgeId) -> AppResult<EdgeInstance> {
        let edge = self.graph.delete_edge(id)?;
        self.events.emit(SessionEvent::EdgeDeleted(id.clone()));
        Ok(edge)
    }

    pub fn select_node(&mut self, id: Option<&NodeId>) -> AppResult<()> {
        self.graph.select_node(id)?;
        self.events.emit(SessionEvent::SelectionChanged);
        Ok(())
    }

    pub fn select_edge(&mut self, id: Option<&EdgeId>) -> AppResult<()> {
        self.graph.select_edge(id)?;
        self.events.emit(SessionEvent::SelectionChanged);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.graph.clear_selection();
        self.events.emit(SessionEvent::SelectionChanged);
    }

    /// Snapshot, then delete the selected node or edge. No-op without a
    /// selection.
    pub fn delete_selected(&mut self) -> Option<Deleted> {
        if self.graph.selected_node().is_none() && self.graph.selected_edge().is_none() {
            return None;
        }
        self.save_snapshot();
        let deleted = self.graph.delete_selected()?;
        match &deleted {
            Deleted::Node { node, edges } => self.emit_node_deleted(&node.id, edges),
            Deleted::Edge(edge) => self.events.emit(SessionEvent::EdgeDeleted(edge.id.clone())),
        }
        self.events.emit(SessionEvent::SelectionChanged);
        Some(deleted)
    }

    /// Snapshot, then remove every node and edge and drop generated code.
    pub fn clear_canvas(&mut self) {
        self.save_snapshot();
        self.graph.clear();
        self.clear_generated();
        self.events.emit(SessionEvent::CanvasCleared);
    }

    fn emit_node_deleted(&mut self, id: &NodeId, edges: &[EdgeInstance]) {
        for edge in edges {
            self.events.emit(SessionEvent::EdgeDeleted(edge.id.clone()));
        }
        self.events.emit(SessionEvent::NodeDeleted(id.clone()));
    }

    // ------------------------------------------------------------------
    // Serialization and history
    // ------------------------------------------------------------------

    /// Wire form of the current graph, tagged with the session framework.
    pub fn serialize_graph(&self) -> SerializedGraph {
        nc_project::serialize_with_metadata(
            &self.graph,
            GraphMetadata::for_framework(self.config.framework.as_str()),
        )
    }

    /// Replace the graph with `wire`, repairing it on the way in.
    ///
    /// Does not snapshot; call [`Session::save_snapshot`] first to make the
    /// load undoable.
    ///
    /// Id sequences continue from the replaced graph, so ids minted before
    /// the load are never issued again.
    pub fn load_graph(&mut self, wire: &SerializedGraph) -> LoadReport {
        let report = self.replace_graph(wire);
        if let Some(framework) = wire
            .metadata
            .as_ref()
            .and_then(|m| m.framework.as_deref())
            .and_then(|f| f.parse::<Framework>().ok())
        {
            self.config.framework = framework;
        }
        report
    }

    fn replace_graph(&mut self, wire: &SerializedGraph) -> LoadReport {
        let (mut graph, report) = nc_project::deserialize(self.graph.registry_handle(), wire);
        graph.continue_ids_after(&self.graph);
        self.graph = graph;
        self.highlighted = None;
        self.events.emit(SessionEvent::GraphReplaced);
        report
    }

    pub fn save_snapshot(&mut self) {
        let current = nc_project::serialize(&self.graph);
        self.history.save_snapshot(current);
        self.emit_history();
    }

    /// Restore the previous snapshot. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        let current = nc_project::serialize(&self.graph);
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        self.replace_graph(&previous);
        self.emit_history();
        debug!("undo");
        true
    }

    /// Re-apply the most recently undone state. Returns `false` when there is
    /// none.
    pub fn redo(&mut self) -> bool {
        let current = nc_project::serialize(&self.graph);
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        self.replace_graph(&next);
        self.emit_history();
        debug!("redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    fn emit_history(&mut self) {
        self.events.emit(SessionEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    // ------------------------------------------------------------------
    // Super-blocks
    // ------------------------------------------------------------------

    pub fn create_super_block(&mut self, node_ids: &[NodeId], name: impl Into<String>) -> Option<SuperBlockId> {
        let id = self.groups.create_super_block(&self.graph, node_ids, name)?;
        self.events.emit(SessionEvent::GroupsChanged(Some(id.clone())));
        Some(id)
    }

    pub fn ungroup_super_block(&mut self, id: &SuperBlockId) -> AppResult<SuperBlock> {
        let removed = self.groups.ungroup_super_block(id)?;
        self.events.emit(SessionEvent::GroupsChanged(None));
        Ok(removed)
    }

    pub fn rename_super_block(&mut self, id: &SuperBlockId, name: impl Into<String>) -> AppResult<()> {
        self.groups.rename(id, name)?;
        self.events.emit(SessionEvent::GroupsChanged(Some(id.clone())));
        Ok(())
    }

    pub fn toggle_super_block(&mut self, id: &SuperBlockId) -> AppResult<bool> {
        let collapsed = self.groups.toggle_collapsed(id)?;
        self.events.emit(SessionEvent::GroupsChanged(Some(id.clone())));
        Ok(collapsed)
    }

    // ------------------------------------------------------------------
    // Code correlation
    // ------------------------------------------------------------------

    /// Highlight a node, returning its code range if the mapping has one.
    pub fn highlight_node(&mut self, id: Option<&NodeId>) -> Option<LineRange> {
        self.highlighted = id.cloned();
        self.events.emit(SessionEvent::Highlighted(self.highlighted.clone()));
        id.and_then(|id| self.node_mapping.get(id).copied())
    }

    pub fn highlighted_node(&self) -> Option<&NodeId> {
        self.highlighted.as_ref()
    }

    /// Node whose range covers `line`; the narrowest range wins.
    pub fn node_at_line(&self, line: usize) -> Option<&NodeId> {
        self.node_mapping
            .iter()
            .filter(|(_, range)| range.contains(line))
            .min_by_key(|(_, range)| range.end_line - range.start_line)
            .map(|(id, _)| id)
    }

    fn clear_generated(&mut self) {
        self.generated_code.clear();
        self.node_mapping.clear();
        self.highlighted = None;
    }

    // ------------------------------------------------------------------
    // Generation and export
    // ------------------------------------------------------------------

    /// Build a generation request and mark the session as generating.
    ///
    /// The graph stays editable while the request is in flight.
    pub fn begin_generation(&mut self) -> AppResult<GenerateRequest> {
        if self.graph.nodes().is_empty() {
            return Err(AppError::EmptyGraph);
        }
        if self.is_generating {
            warn!("generation requested while another is in flight");
        }
        self.is_generating = true;
        self.events.emit(SessionEvent::GenerationStarted);
        Ok(GenerateRequest {
            graph: self.serialize_graph(),
            framework: self.config.framework,
            provider: self.config.provider,
        })
    }

    /// Install code and mapping together. The graph is not consulted.
    pub fn apply_generation(&mut self, response: GenerateResponse) {
        self.generated_code = response.code;
        self.node_mapping = response.node_mapping;
        self.highlighted = None;
        self.is_generating = false;
        debug!(
            lines = self.generated_code.lines().count(),
            mapped = self.node_mapping.len(),
            "applied generated code"
        );
        self.events.emit(SessionEvent::GenerationFinished);
    }

    /// Clear the generating flag after a collaborator failure.
    pub fn fail_generation(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "generation failed");
        self.is_generating = false;
        self.events.emit(SessionEvent::GenerationFailed(message));
    }

    /// Run a full generation round trip against `generator`.
    pub fn generate_with(&mut self, generator: &dyn CodeGenerator) -> AppResult<()> {
        let request = self.begin_generation()?;
        match generator.generate(&request) {
            Ok(response) => {
                self.apply_generation(response);
                Ok(())
            }
            Err(err) => {
                self.fail_generation(err.to_string());
                Err(err)
            }
        }
    }

    /// Package the generated code. `filename` defaults to the configured one.
    pub fn export(&self, format: ExportFormat, filename: Option<&str>) -> AppResult<ExportedFile> {
        if self.generated_code.trim().is_empty() {
            return Err(AppError::NoCode);
        }
        let filename = filename.unwrap_or(&self.config.export_filename);
        crate::export::export(&self.generated_code, format, Some(filename))
    }
}
