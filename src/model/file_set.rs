//! The semantic view of a whole descriptor set.
//!
//! Construction runs in a fixed order: root package detection, the resource
//! registry, every declaration of every file, and finally the surface that the
//! root package exposes (services plus every message and enum reachable from
//! them or declared at top level).

use crate::error::Result;
use crate::model::annotations;
use crate::model::enums::Enum;
use crate::model::location::{LocationIndex, SourceLocation};
use crate::model::message::Message;
use crate::model::registry::{ResourceEntry, ResourceRegistry};
use crate::model::service::Service;
use crate::model::{FileContext, child_path, tag};
use protobuf::Message as _;
use protobuf::descriptor::{DescriptorProto, FileDescriptorProto, FileDescriptorSet, FileOptions};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// One package segment that names an API version, e.g. `v1`, `v2p1beta1`
static VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+(p\d+)?((alpha|beta)\d*)?$").expect("valid regex"));

/// Per-language packaging option names with their `FileOptions` field numbers
pub const PACKAGING_OPTIONS: [(&str, i32); 10] = [
    ("java_package", 1),
    ("java_outer_classname", 8),
    ("go_package", 11),
    ("objc_class_prefix", 36),
    ("csharp_namespace", 37),
    ("swift_prefix", 39),
    ("php_class_prefix", 40),
    ("php_namespace", 41),
    ("php_metadata_namespace", 44),
    ("ruby_package", 45),
];

fn packaging_value<'a>(options: &'a FileOptions, name: &str) -> Option<&'a str> {
    let value = match name {
        "java_package" => options.java_package.as_deref(),
        "java_outer_classname" => options.java_outer_classname.as_deref(),
        "go_package" => options.go_package.as_deref(),
        "objc_class_prefix" => options.objc_class_prefix.as_deref(),
        "csharp_namespace" => options.csharp_namespace.as_deref(),
        "swift_prefix" => options.swift_prefix.as_deref(),
        "php_class_prefix" => options.php_class_prefix.as_deref(),
        "php_namespace" => options.php_namespace.as_deref(),
        "php_metadata_namespace" => options.php_metadata_namespace.as_deref(),
        "ruby_package" => options.ruby_package.as_deref(),
        _ => None,
    };
    value.filter(|v| !v.is_empty())
}

/// Option name → value → where the value is declared
pub type PackagingOptions = BTreeMap<&'static str, BTreeMap<String, SourceLocation>>;

#[derive(Debug)]
pub struct FileSet<'a> {
    root_package: String,
    api_version: Option<String>,
    definition_files: Vec<&'a FileDescriptorProto>,
    registry: Arc<ResourceRegistry>,
    global_messages: HashMap<String, Arc<Message<'a>>>,
    global_enums: HashMap<String, Arc<Enum<'a>>>,
    messages_map: BTreeMap<String, Arc<Message<'a>>>,
    enums_map: BTreeMap<String, Arc<Enum<'a>>>,
    services_map: BTreeMap<String, Service<'a>>,
    packaging_options: PackagingOptions,
    file_resources: BTreeMap<String, ResourceEntry>,
}

impl<'a> FileSet<'a> {
    pub fn new(descriptor_set: &'a FileDescriptorSet) -> Result<Self> {
        let files = &descriptor_set.file;
        let root_package = root_package(files);
        let api_version = api_version(&root_package);
        debug!(root_package = %root_package, api_version = ?api_version, "Detected root package");

        let locations: Vec<Arc<LocationIndex>> = files
            .iter()
            .map(|file| Arc::new(LocationIndex::new(file)))
            .collect();

        let mut registry = ResourceRegistry::new();
        let mut file_resources = BTreeMap::new();
        for (file, index) in files.iter().zip(&locations) {
            let definitions = annotations::resource_definitions(
                file.options.get_or_default().unknown_fields(),
                file.name(),
            )?;
            for (i, resource) in definitions.into_iter().enumerate() {
                let entry = ResourceEntry {
                    resource,
                    location: index.lookup(&[
                        tag::FILE_OPTIONS,
                        annotations::extension::RESOURCE_DEFINITION as i32,
                        i as i32,
                    ]),
                };
                if file.package() == root_package {
                    file_resources.insert(entry.resource_type().to_string(), entry.clone());
                }
                registry.register(entry)?;
            }
            for (i, message) in file.message_type.iter().enumerate() {
                register_message_resources(
                    message,
                    child_path(&[], tag::FILE_MESSAGE, i),
                    file.name(),
                    index,
                    &mut registry,
                )?;
            }
        }
        let registry = Arc::new(registry);
        debug!(resources = registry.len(), "Built resource registry");

        let mut global_messages = HashMap::new();
        let mut global_enums = HashMap::new();
        let mut contexts = Vec::with_capacity(files.len());
        for (file, index) in files.iter().zip(&locations) {
            let cx = FileContext {
                file,
                locations: Arc::clone(index),
                registry: Arc::clone(&registry),
            };
            let scope = cx.scope();
            for (i, message) in file.message_type.iter().enumerate() {
                let message = Arc::new(Message::new(
                    message,
                    &scope,
                    child_path(&[], tag::FILE_MESSAGE, i),
                    &cx,
                )?);
                collect_declarations(&message, &mut global_messages, &mut global_enums);
            }
            for (i, proto) in file.enum_type.iter().enumerate() {
                let e = Enum::new(proto, &scope, child_path(&[], tag::FILE_ENUM, i), &cx);
                global_enums.insert(e.full_name().to_string(), Arc::new(e));
            }
            contexts.push(cx);
        }

        let definition_files: Vec<&'a FileDescriptorProto> = files
            .iter()
            .filter(|file| file.package() == root_package)
            .collect();

        let mut set = Self {
            root_package,
            api_version,
            definition_files,
            registry,
            global_messages,
            global_enums,
            messages_map: BTreeMap::new(),
            enums_map: BTreeMap::new(),
            services_map: BTreeMap::new(),
            packaging_options: BTreeMap::new(),
            file_resources,
        };

        let root_package = set.root_package.clone();
        for cx in contexts.iter().filter(|cx| cx.file.package() == root_package) {
            for (i, proto) in cx.file.service.iter().enumerate() {
                let service = Service::new(
                    proto,
                    child_path(&[], tag::FILE_SERVICE, i),
                    cx,
                    &set.global_messages,
                )?;
                set.services_map.insert(service.name().to_string(), service);
            }
            set.collect_packaging_options(cx);
        }
        set.build_surface();

        debug!(
            services = set.services_map.len(),
            messages = set.messages_map.len(),
            enums = set.enums_map.len(),
            "Built API surface"
        );
        Ok(set)
    }

    fn collect_packaging_options(&mut self, cx: &FileContext<'a>) {
        let Some(options) = cx.file.options.as_ref() else {
            return;
        };
        for (name, number) in PACKAGING_OPTIONS {
            if let Some(value) = packaging_value(options, name) {
                self.packaging_options
                    .entry(name)
                    .or_default()
                    .entry(value.to_string())
                    .or_insert_with(|| cx.locations.lookup(&[tag::FILE_OPTIONS, number]));
            }
        }
    }

    /// Walks everything reachable from the root package's declarations and
    /// keeps only the outermost registered declarations.
    fn build_surface(&mut self) {
        let mut pending: Vec<String> = Vec::new();
        for file in &self.definition_files {
            let scope = match file.package() {
                "" => String::new(),
                package => format!(".{package}"),
            };
            pending.extend(file.message_type.iter().map(|m| format!("{scope}.{}", m.name())));
            pending.extend(file.enum_type.iter().map(|e| format!("{scope}.{}", e.name())));
        }
        for service in self.services_map.values() {
            for method in service.methods().values() {
                pending.push(method.input_type().to_string());
                pending.push(method.output_type().to_string());
                pending.extend(method.lro_type_names());
            }
        }

        let mut used_messages: BTreeMap<String, Arc<Message<'a>>> = BTreeMap::new();
        let mut used_enums: BTreeMap<String, Arc<Enum<'a>>> = BTreeMap::new();
        let mut seen = HashSet::new();
        while let Some(name) = pending.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(message) = self.global_messages.get(&name) {
                pending.extend(message.referenced_types().into_iter().map(str::to_string));
                used_messages.insert(name, Arc::clone(message));
            } else if let Some(e) = self.global_enums.get(&name) {
                used_enums.insert(name, Arc::clone(e));
            }
        }

        // Nested declarations are reached through their outermost message
        let has_used_ancestor = |name: &str| {
            let mut scope = name;
            while let Some((parent, _)) = scope.rsplit_once('.') {
                if used_messages.contains_key(parent) {
                    return true;
                }
                scope = parent;
            }
            false
        };
        let outer_messages: BTreeSet<String> = used_messages
            .keys()
            .filter(|name| !has_used_ancestor(name))
            .cloned()
            .collect();
        let outer_enums: BTreeSet<String> = used_enums
            .keys()
            .filter(|name| !has_used_ancestor(name))
            .cloned()
            .collect();

        for name in outer_messages {
            if let Some(message) = used_messages.remove(&name) {
                self.messages_map.insert(self.relative_name(&name), message);
            }
        }
        for name in outer_enums {
            if let Some(e) = used_enums.remove(&name) {
                self.enums_map.insert(self.relative_name(&name), e);
            }
        }
    }

    /// Strips the root package from a full name so that surfaces of two API
    /// versions line up. Names outside the root package stay fully qualified.
    fn relative_name(&self, full_name: &str) -> String {
        if self.root_package.is_empty() {
            return full_name.trim_start_matches('.').to_string();
        }
        let prefix = format!(".{}.", self.root_package);
        match full_name.strip_prefix(&prefix) {
            Some(relative) => relative.to_string(),
            None => full_name.to_string(),
        }
    }

    pub fn root_package(&self) -> &str {
        &self.root_package
    }

    /// API version of the root package, e.g. `v1beta1`
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Files whose package is the root package
    pub fn definition_files(&self) -> &[&'a FileDescriptorProto] {
        &self.definition_files
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Every message of every file, nested ones included, by full name
    pub fn global_messages(&self) -> &HashMap<String, Arc<Message<'a>>> {
        &self.global_messages
    }

    pub fn global_enums(&self) -> &HashMap<String, Arc<Enum<'a>>> {
        &self.global_enums
    }

    /// Outermost used messages, keyed relative to the root package
    pub fn messages_map(&self) -> &BTreeMap<String, Arc<Message<'a>>> {
        &self.messages_map
    }

    /// Outermost used enums, keyed relative to the root package
    pub fn enums_map(&self) -> &BTreeMap<String, Arc<Enum<'a>>> {
        &self.enums_map
    }

    pub fn services_map(&self) -> &BTreeMap<String, Service<'a>> {
        &self.services_map
    }

    pub fn packaging_options(&self) -> &PackagingOptions {
        &self.packaging_options
    }

    /// File-level resource definitions of the definition files, by type
    pub fn file_resources(&self) -> &BTreeMap<String, ResourceEntry> {
        &self.file_resources
    }
}

fn register_message_resources(
    message: &DescriptorProto,
    path: Vec<i32>,
    file_name: &str,
    locations: &LocationIndex,
    registry: &mut ResourceRegistry,
) -> Result<()> {
    let options = message.options.get_or_default().unknown_fields();
    if let Some(resource) = annotations::resource(options, file_name)? {
        registry.register(ResourceEntry {
            resource,
            location: locations.lookup_within(
                &path,
                &[tag::MESSAGE_OPTIONS, annotations::extension::RESOURCE as i32],
            ),
        })?;
    }
    for (i, nested) in message.nested_type.iter().enumerate() {
        register_message_resources(
            nested,
            child_path(&path, tag::MESSAGE_NESTED, i),
            file_name,
            locations,
            registry,
        )?;
    }
    Ok(())
}

fn collect_declarations<'a>(
    message: &Arc<Message<'a>>,
    messages: &mut HashMap<String, Arc<Message<'a>>>,
    enums: &mut HashMap<String, Arc<Enum<'a>>>,
) {
    messages.insert(message.full_name().to_string(), Arc::clone(message));
    for e in message.nested_enums().values() {
        enums.insert(e.full_name().to_string(), Arc::clone(e));
    }
    for nested in message.nested_messages().values() {
        collect_declarations(nested, messages, enums);
    }
}

/// The package that no other package of the set imports. Library files such
/// as `google/api/*.proto` are always imported by the API's own files.
fn root_package(files: &[FileDescriptorProto]) -> String {
    let package_of: HashMap<&str, &str> = files.iter().map(|f| (f.name(), f.package())).collect();
    let mut imported: HashSet<&str> = HashSet::new();
    for file in files {
        for dependency in &file.dependency {
            if let Some(package) = package_of.get(dependency.as_str()) {
                if *package != file.package() {
                    imported.insert(package);
                }
            }
        }
    }
    files
        .iter()
        .find(|f| !imported.contains(f.package()))
        .or_else(|| files.first())
        .map(|f| f.package().to_string())
        .unwrap_or_default()
}

fn api_version(package: &str) -> Option<String> {
    package
        .split('.')
        .filter(|segment| VERSION_SEGMENT.is_match(segment))
        .last()
        .map(str::to_string)
}
