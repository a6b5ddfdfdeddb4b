//! Filter engine session
//!
//! One `Engine` lives for one page load. It owns the container registry,
//! the context id counter, the page filter and the notification queue, and
//! exposes the operations a host calls when content is inserted or a filter
//! is selected.

use cf_dom::{Document, DomTree, NodeId};
use url::Url;

use crate::config::FilterConfig;
use crate::context::ContextResolver;
use crate::error::{InvariantViolation, Result};
use crate::filter;
use crate::notify::{Notification, NotificationQueue};
use crate::page::{self, PageIdentity};
use crate::params;
use crate::registry::{self, ContainerRegistry};
use crate::view::{self, ViewFragments};

/// Outcome of handing content to [`Engine::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered {
        container: NodeId,
        parent: Option<NodeId>,
    },
    Skipped(SkipReason),
}

impl Registration {
    pub fn is_registered(&self) -> bool {
        matches!(self, Registration::Registered { .. })
    }
}

/// Why content was not registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The content is already a managed container
    AlreadyRegistered,
    /// The content holds managed containers itself
    OverlapsManaged,
    /// The content is not part of the document
    Detached,
    /// Filtering does not apply to this page
    Unavailable,
}

/// Context ids recorded on elements
#[derive(Debug, Default)]
struct ContextStore {
    next_id: u64,
}

impl ContextStore {
    /// Elements recorded under context `id`, in document order
    fn lookup(tree: &DomTree, config: &FilterConfig, id: u64) -> Vec<NodeId> {
        tree.elements_with_class(NodeId::ROOT, &config.context_id_class(id))
    }

    fn cached(tree: &DomTree, config: &FilterConfig, tag: NodeId) -> Option<Vec<NodeId>> {
        let id = tree
            .element(tag)?
            .data(&config.context_data_key)?
            .parse::<u64>()
            .ok()?;
        Some(Self::lookup(tree, config, id))
    }

    /// Context of `tag`, inferred and recorded on first use
    fn context(
        &mut self,
        tree: &mut DomTree,
        config: &FilterConfig,
        resolver: &mut ContextResolver<'_>,
        queue: &mut NotificationQueue,
        tag: NodeId,
    ) -> Result<Vec<NodeId>> {
        if let Some(context) = Self::cached(tree, config, tag) {
            return Ok(context);
        }

        let root = resolver.root();
        let mut context = resolver.infer(tree, tag)?;
        context.retain(|&element| registry::container_of(tree, config, element) == Some(root));
        if context.is_empty() {
            tracing::warn!(%tag, "No context found");
            return Ok(context);
        }

        let id = match Self::shared_id(tree, config, &context) {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                let class = config.context_id_class(id);
                for &element in &context {
                    tree.add_class(element, &config.context_class);
                    tree.add_class(element, &class);
                }
                id
            }
        };
        if let Some(data) = tree.element_mut(tag) {
            data.set_data(&config.context_data_key, &id.to_string());
        }

        let context = Self::lookup(tree, config, id);
        tracing::debug!(%tag, id, size = context.len(), "Context inferred");
        queue.push(Notification::ContextInferred {
            tag,
            id,
            context: context.clone(),
        });
        Ok(context)
    }

    /// Id already recorded for exactly these elements
    fn shared_id(tree: &DomTree, config: &FilterConfig, context: &[NodeId]) -> Option<u64> {
        let (&first, rest) = context.split_first()?;
        let mut candidates: Vec<u64> = tree
            .element(first)?
            .classes
            .numeric_suffixes(&config.context_id_class_prefix)
            .collect();
        candidates.retain(|&id| {
            let class = config.context_id_class(id);
            rest.iter().all(|&e| tree.has_class(e, &class))
        });

        let mut expected = context.to_vec();
        expected.sort_by(|&a, &b| view::post_order(tree, a, b));
        candidates.into_iter().find(|&id| {
            let mut recorded = Self::lookup(tree, config, id);
            recorded.sort_by(|&a, &b| view::post_order(tree, a, b));
            recorded == expected
        })
    }
}

/// Content filter engine for one page
#[derive(Debug)]
pub struct Engine {
    config: FilterConfig,
    page: PageIdentity,
    available: bool,
    forced: bool,
    page_filter: u32,
    active_view: Option<usize>,
    registry: ContainerRegistry,
    contexts: ContextStore,
    notifications: NotificationQueue,
}

impl Engine {
    pub fn new(config: FilterConfig, page: PageIdentity) -> Self {
        let available = page::is_filtering_available(&config, &page);
        tracing::debug!(title = %page.title.prefixed_text(), available, "Created filter engine");
        Self {
            page_filter: config.filter_max(),
            config,
            page,
            available,
            forced: false,
            active_view: None,
            registry: ContainerRegistry::new(),
            contexts: ContextStore::default(),
            notifications: NotificationQueue::new(),
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn page(&self) -> &PageIdentity {
        &self.page
    }

    /// Whether filtering applies, by page identity or by an enable marker
    pub fn is_filtering_enabled(&self) -> bool {
        self.available || self.forced
    }

    /// Page-wide filter bitmask
    pub fn page_filter(&self) -> u32 {
        self.page_filter
    }

    /// Whether the filter at `index` can be selected on this page
    pub fn is_filter_enabled(&self, index: usize) -> bool {
        self.config
            .filter_bit(index)
            .is_ok_and(|bit| self.page_filter & bit != 0)
    }

    pub fn active_view(&self) -> Option<usize> {
        self.active_view
    }

    /// Drain pending notifications
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.take_records()
    }

    /// Put freshly inserted content under filter management
    ///
    /// Stale view marks inside the content are cleaned up, every tag gets its
    /// context recorded and views already computed on the parent container
    /// are composed for the new content.
    pub fn register(&mut self, doc: &mut Document, content: NodeId) -> Result<Registration> {
        let config = &self.config;
        let tree = doc.tree();
        if tree.has_class(content, &config.container_class) {
            tracing::debug!(%content, "Content already registered");
            return Ok(Registration::Skipped(SkipReason::AlreadyRegistered));
        }
        if let Some(managed) = tree.first_with_class(content, &config.container_class) {
            tracing::error!(%content, %managed, "Content overlaps managed content; filtering skipped");
            return Ok(Registration::Skipped(SkipReason::OverlapsManaged));
        }
        if !tree.is_connected(content) {
            tracing::debug!(%content, "Content is not part of the document");
            return Ok(Registration::Skipped(SkipReason::Detached));
        }

        let parent = registry::parent_container(tree, config, content);
        let is_main = tree.has_class(content, &config.body_content_class);
        if is_main {
            self.forced = filter::is_filtering_forced(doc, config);
        }
        if !self.is_filtering_enabled() {
            return Ok(Registration::Skipped(SkipReason::Unavailable));
        }

        self.notifications
            .push(Notification::BeforeRegistered { container: content });
        view::cleanup(doc.tree_mut(), &self.config, content);
        doc.tree_mut().add_class(content, &self.config.container_class);

        if is_main {
            tracing::info!("Initializing state.");
            self.page_filter = filter::page_filter(doc, &self.config);
            self.notifications
                .push(Notification::PageFilter(self.page_filter));
        }

        let Self {
            config,
            contexts,
            notifications,
            ..
        } = self;
        let tree = doc.tree_mut();
        let mut resolver = ContextResolver::new(config, content);
        let tags = filter::tags(tree, config, content);
        for &tag in tags.iter().rev() {
            if registry::container_of(tree, config, tag) == Some(content) {
                contexts.context(tree, config, &mut resolver, notifications, tag)?;
            }
        }

        self.registry.register(content, parent);
        tracing::info!(%content, parent = ?parent, tags = tags.len(), "Registered content");
        self.notifications.push(Notification::Registered {
            container: content,
            parent,
        });

        if let Some(parent) = parent {
            for index in view::computed_views(doc.tree(), &self.config, parent) {
                if self.config.filter_bit(index).is_ok() {
                    self.compose_container(doc, content, index)?;
                }
            }
        }

        Ok(Registration::Registered {
            container: content,
            parent,
        })
    }

    /// Take a container out of filter management
    ///
    /// Containers nested inside it are released with it.
    pub fn release(&mut self, doc: &mut Document, container: NodeId) -> bool {
        let tree = doc.tree_mut();
        view::cleanup(tree, &self.config, container);
        let nested = tree.elements_with_class(container, &self.config.container_class);
        for &inner in nested.iter().filter(|&&inner| inner != container) {
            tree.remove_class(inner, &self.config.container_class);
            self.registry.release(inner);
        }
        for inner in self.registry.all() {
            if inner != container && tree.contains(container, inner) {
                self.registry.release(inner);
            }
        }
        tree.remove_class(container, &self.config.container_class);
        let known = self.registry.release(container);
        tracing::debug!(%container, known, "Released container");
        known
    }

    /// Live root containers
    pub fn containers(&mut self, doc: &Document) -> Vec<NodeId> {
        self.registry.sweep(doc.tree(), &self.config)
    }

    /// Every filter tag under `root`, in document order
    pub fn tags(&self, doc: &Document, root: NodeId) -> Vec<NodeId> {
        filter::tags(doc.tree(), &self.config, root)
    }

    /// Filter bitmask of a tag
    pub fn filter_of(&self, doc: &mut Document, tag: NodeId) -> u32 {
        filter::filter_of(doc.tree_mut(), &self.config, tag)
    }

    /// Context of a tag; empty when the tag governs nothing
    ///
    /// A recorded context is returned as is. Otherwise the context is
    /// inferred inside the tag's container, which may wrap content.
    pub fn context(&mut self, doc: &mut Document, tag: NodeId) -> Result<Vec<NodeId>> {
        let tree = doc.tree_mut();
        if let Some(context) = ContextStore::cached(tree, &self.config, tag) {
            return Ok(context);
        }
        let Some(container) = registry::container_of(tree, &self.config, tag) else {
            tracing::debug!(%tag, "Tag outside managed content");
            return Ok(Vec::new());
        };
        let mut resolver = ContextResolver::new(&self.config, container);
        self.contexts.context(
            tree,
            &self.config,
            &mut resolver,
            &mut self.notifications,
            tag,
        )
    }

    /// Compose view `index` in every live container
    ///
    /// Containers that already computed the view are left alone. Returns
    /// the fragments marked by this call.
    pub fn compute_view(&mut self, doc: &mut Document, index: usize) -> Result<Vec<NodeId>> {
        self.config.filter_bit(index)?;
        self.registry.sweep(doc.tree(), &self.config);

        let mut marked = Vec::new();
        for container in self.registry.all() {
            if let Some(view) = self.compose_container(doc, container, index)? {
                marked.extend(view.fragments);
            }
        }
        Ok(marked)
    }

    fn compose_container(
        &mut self,
        doc: &mut Document,
        container: NodeId,
        index: usize,
    ) -> Result<Option<ViewFragments>> {
        if view::is_view_computed(doc.tree(), &self.config, container, index) {
            return Ok(None);
        }
        let bit = self.config.filter_bit(index)?;

        let Self {
            config,
            contexts,
            notifications,
            ..
        } = self;
        let tree = doc.tree_mut();
        let mut resolver = ContextResolver::new(config, container);
        let mut selection = Vec::new();
        for tag in filter::tags(tree, config, container) {
            if registry::container_of(tree, config, tag) != Some(container) {
                continue;
            }
            if filter::filter_of(tree, config, tag) & bit != 0 {
                selection.push(tag);
                continue;
            }
            let context = contexts.context(tree, config, &mut resolver, notifications, tag)?;
            if context.is_empty() {
                continue;
            }
            selection.push(tag);
            selection.extend(context);
        }

        let view = view::compose(doc, config, container, index, selection)?;
        tracing::info!(%container, index, fragments = view.fragments.len(), "Computed view");
        notifications.push(Notification::ViewComputed {
            container,
            index,
            fragments: view.fragments.clone(),
        });
        Ok(Some(view))
    }

    /// Switch the active view; `None` shows every version
    ///
    /// Every fragment of the selected view gets the active class.
    pub fn activate_view(&mut self, doc: &mut Document, index: Option<usize>) -> Result<()> {
        let active = self.config.view_active_class.clone();
        for element in doc.tree().elements_with_class(NodeId::ROOT, &active) {
            doc.tree_mut().remove_class(element, &active);
        }

        if let Some(index) = index {
            self.compute_view(doc, index)?;
            let tree = doc.tree_mut();
            for element in tree.elements_with_class(NodeId::ROOT, &self.config.view_class_for(index)) {
                tree.add_class(element, &active);
            }
        }

        self.active_view = index;
        tracing::debug!(view = ?index, "Activated view");
        self.notifications.push(Notification::ViewUpdated(index));
        Ok(())
    }

    /// Toggle the hover mark on the fragments of view `index`
    pub fn highlight_view(&self, doc: &mut Document, index: usize, on: bool) -> usize {
        let tree = doc.tree_mut();
        let fragments = view::view_fragments(tree, &self.config, NodeId::ROOT, index);
        for &element in &fragments {
            toggle(tree, element, &self.config.view_hover_class, on);
        }
        fragments.len()
    }

    /// Toggle the hover mark on the context of `tag`
    pub fn highlight_context(&mut self, doc: &mut Document, tag: NodeId, on: bool) -> Result<usize> {
        let context = self.context(doc, tag)?;
        let tree = doc.tree_mut();
        for &element in &context {
            toggle(tree, element, &self.config.context_hover_class, on);
        }
        Ok(context.len())
    }

    /// Filter index selected by a page URL, if valid
    pub fn selected_filter(&self, url: &Url) -> Option<usize> {
        params::filter_param(url, &self.config.url_parameter)
            .filter(|&index| self.config.filter_bit(index).is_ok())
    }

    /// Carry the selected filter on article links inside managed content
    ///
    /// Only links to pages where filtering is available are rewritten;
    /// links of the filter buttons themselves are left alone. Returns how
    /// many links changed.
    pub fn filter_links(
        &mut self,
        doc: &mut Document,
        base: &Url,
        selected: Option<usize>,
    ) -> Result<usize> {
        let mut rewritten = 0;
        for container in self.containers(doc) {
            let tree = doc.tree_mut();
            for anchor in tree.elements_by_tag_name(container, "a") {
                let parent = tree
                    .parent_element(anchor)
                    .ok_or(InvariantViolation::MissingParent(anchor))?;
                if tree.has_class(parent, &self.config.button_class) {
                    continue;
                }
                let Some(href) = tree.attr(anchor, "href").filter(|h| !h.is_empty()) else {
                    continue;
                };
                let url = match base.join(href) {
                    Ok(url) => url,
                    Err(err) => {
                        tracing::trace!(href, %err, "Ignoring unparsable link");
                        continue;
                    }
                };
                let Some(title) = params::article_title(&url, &self.config.article_path) else {
                    continue;
                };
                let target = PageIdentity::new(&title, "view");
                if !page::is_filtering_available(&self.config, &target) {
                    continue;
                }

                let updated = params::with_filter_param(&url, &self.config.url_parameter, selected);
                tree.set_attr(anchor, "href", updated.as_str());
                rewritten += 1;
            }
        }
        tracing::debug!(rewritten, selected = ?selected, "Updated filter links");
        Ok(rewritten)
    }
}

fn toggle(tree: &mut DomTree, element: NodeId, class: &str, on: bool) {
    if on {
        tree.add_class(element, class);
    } else {
        tree.remove_class(element, class);
    }
}
