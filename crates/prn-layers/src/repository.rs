use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use prn_gate::{UploadBatch, UploadGate, ValidationFailure, ValidationIssue};
use prn_keys::{
    layout, validate_event_name, validate_file_name, LayerState, ObjectKey, PublicUrls, Version,
};
use prn_store::{ObjectStore, StoreError};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::counter::VersionCounter;
use crate::error::{LayerError, LayerResult};
use crate::types::{EventSummary, LayerLink, UploadReceipt, VersionView};

/// Error value returned in place of a manifest that does not exist.
pub const MANIFEST_NOT_FOUND: &str = "Failed to find the event name manifest";

/// Versioned layer storage for every event in one bucket.
///
/// All operations resolve synchronously against the object store. Version
/// directories are the unit of lifecycle state: approve and revert move a
/// whole `v<N>` directory between the pending and approved prefixes.
pub struct LayerRepository {
    store: Arc<dyn ObjectStore>,
    urls: PublicUrls,
    counter: VersionCounter,
    gate: UploadGate,
}

impl LayerRepository {
    /// Create a repository using the default upload gate.
    pub fn new(store: Arc<dyn ObjectStore>, urls: PublicUrls) -> Self {
        Self {
            counter: VersionCounter::new(store.clone()),
            store,
            urls,
            gate: UploadGate::default(),
        }
    }

    /// Replace the upload gate.
    pub fn with_gate(mut self, gate: UploadGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn urls(&self) -> &PublicUrls {
        &self.urls
    }

    pub fn counter(&self) -> &VersionCounter {
        &self.counter
    }

    pub fn gate(&self) -> &UploadGate {
        &self.gate
    }

    // ---- Events ----

    /// Every event that has a manifest.
    pub fn list_events(&self) -> LayerResult<Vec<EventSummary>> {
        let entries = self.store.list(&layout::manifest_prefix(), None)?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| match ObjectKey::parse(&entry.key) {
                ObjectKey::Manifest { event } => Some(EventSummary {
                    name: event,
                    url: self.urls.url_for(&entry.key),
                }),
                _ => {
                    debug!(key = %entry.key, "skipping non-manifest key");
                    None
                }
            })
            .collect())
    }

    /// The parsed manifest of `event`.
    ///
    /// A missing manifest is not an error: the result is an object with an
    /// `error` message instead.
    pub fn event_manifest(&self, event: &str) -> LayerResult<Value> {
        validate_event_name(event)?;
        let data = match self.store.get(&layout::manifest_key(event)) {
            Ok(data) => data,
            Err(StoreError::NotFound(_)) => return Ok(json!({ "error": MANIFEST_NOT_FOUND })),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data).map_err(|source| LayerError::MalformedManifest {
            event: event.to_string(),
            source,
        })
    }

    // ---- Listings ----

    /// All versions of `event` in `state`, newest first.
    pub fn list_layers(&self, event: &str, state: LayerState) -> LayerResult<Vec<VersionView>> {
        validate_event_name(event)?;
        let prefix = layout::layers_prefix(event, state);
        self.collect_versions(&prefix, None, |_| true)
    }

    /// The named file of one version together with the version's metadata
    /// document. Empty when the version does not hold the file.
    pub fn find_layer(
        &self,
        event: &str,
        state: LayerState,
        version: Version,
        file_name: &str,
    ) -> LayerResult<Vec<VersionView>> {
        validate_event_name(event)?;
        validate_file_name(file_name)?;
        let prefix = layout::version_prefix(event, state, version);
        let views = self.collect_versions(&prefix, Some('/'), |key| key.file_name == file_name)?;
        Ok(views
            .into_iter()
            .filter(|view| !view.layers.is_empty())
            .collect())
    }

    /// List `prefix`, group layer keys by version and render them newest
    /// first. Metadata documents are always kept; other files only when
    /// `include` accepts them. Keys that do not parse as layer keys are
    /// skipped.
    fn collect_versions(
        &self,
        prefix: &str,
        delimiter: Option<char>,
        include: impl Fn(&prn_keys::LayerKey) -> bool,
    ) -> LayerResult<Vec<VersionView>> {
        let mut versions: BTreeMap<Version, (Option<String>, Vec<LayerLink>)> = BTreeMap::new();

        for entry in self.store.list(prefix, delimiter)? {
            let layer = match ObjectKey::parse(&entry.key) {
                ObjectKey::Layer(layer) => layer,
                ObjectKey::VersionMarker { .. } => continue,
                _ => {
                    warn!(key = %entry.key, "skipping unrecognized layer key");
                    continue;
                }
            };

            let (metadata_url, layers) = versions.entry(layer.version).or_default();
            if layer.is_metadata() {
                *metadata_url = Some(self.urls.url_for(&entry.key));
            } else if include(&layer) {
                layers.push(LayerLink {
                    name: layer.base_name().to_string(),
                    url: self.urls.url_for(&entry.key),
                });
            }
        }

        Ok(versions
            .into_iter()
            .rev()
            .map(|(version, (metadata_url, layers))| VersionView {
                version,
                metadata_url,
                layers,
            })
            .collect())
    }

    // ---- Transitions ----

    /// Move every object of pending `version` to the approved prefix.
    ///
    /// Returns the new locations; an empty version yields an empty list.
    pub fn approve(&self, event: &str, version: Version) -> LayerResult<Vec<LayerLink>> {
        self.transition(event, version, LayerState::Pending)
    }

    /// Move every object of approved `version` back to the pending prefix.
    pub fn revert(&self, event: &str, version: Version) -> LayerResult<Vec<LayerLink>> {
        self.transition(event, version, LayerState::Approved)
    }

    fn transition(
        &self,
        event: &str,
        version: Version,
        from: LayerState,
    ) -> LayerResult<Vec<LayerLink>> {
        validate_event_name(event)?;
        let to = from.other();
        let source_prefix = layout::version_prefix(event, from, version);
        let entries = self.store.list(&source_prefix, Some('/'))?;

        let mut moved = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(file_name) = entry.key.strip_prefix(&source_prefix) else {
                continue;
            };
            let target_key = layout::layer_key(event, to, version, file_name);
            self.store.move_object(&entry.key, &target_key)?;
            debug!(from = %entry.key, to = %target_key, "layer object moved");

            let name = ObjectKey::parse(&target_key)
                .into_layer()
                .map_or_else(|| file_name.to_string(), |key| key.base_name().to_string());
            moved.push(LayerLink {
                name,
                url: self.urls.url_for(&target_key),
            });
        }

        info!(event, %version, %from, %to, objects = moved.len(), "layer version moved");
        Ok(moved)
    }

    // ---- Uploads ----

    /// Store one file under pending `version`, returning the stored file name.
    pub fn upload_file(
        &self,
        event: &str,
        version: Version,
        file_name: &str,
        content: Bytes,
    ) -> LayerResult<String> {
        validate_event_name(event)?;
        validate_file_name(file_name)?;
        let key = layout::layer_key(event, LayerState::Pending, version, file_name);
        self.store.put(&key, content)?;
        debug!(key = %key, "layer file stored");
        Ok(file_name.to_string())
    }

    /// Validate and store a batch as the next pending version of `event`.
    ///
    /// Nothing is written unless validation passes. Layer files are written
    /// first, then the metadata document, and the version marker is
    /// committed last. Uploads to the same event are not serialized; two
    /// concurrent batches may be assigned the same version.
    pub fn upload_batch(&self, event: &str, batch: &UploadBatch) -> LayerResult<UploadReceipt> {
        validate_event_name(event)?;
        self.gate.validate(batch)?;

        let Some(metadata) = &batch.metadata else {
            return Err(ValidationFailure::new(
                "presence",
                vec![ValidationIssue::MissingMetadataFile],
            )
            .into());
        };
        validate_file_name(&metadata.file_name)?;
        for layer in &batch.layers {
            validate_file_name(&layer.file_name)?;
        }

        let version = self.counter.next_version(event)?;

        let mut layers = Vec::with_capacity(batch.layers.len());
        for layer in &batch.layers {
            layers.push(self.upload_file(
                event,
                version,
                &layer.file_name,
                layer.content.clone(),
            )?);
        }
        let metadata = self.upload_file(
            event,
            version,
            &metadata.file_name,
            metadata.content.clone(),
        )?;

        self.counter.commit_version(event, version)?;
        info!(event, %version, layers = layers.len(), "upload batch stored");

        Ok(UploadReceipt {
            version,
            layers,
            metadata,
        })
    }
}

impl std::fmt::Debug for LayerRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerRepository")
            .field("bucket", &self.urls.bucket())
            .field("gate_stages", &self.gate.stage_count())
            .finish_non_exhaustive()
    }
}
