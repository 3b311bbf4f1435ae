// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The compile pipeline: resolve sockets, order the graph, evaluate the
//! nodes feeding each root once, emit.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use tessel_core::graph::topological_sort;

use crate::cache::{CompilationCache, Requirements};
use crate::emit;
use crate::error::CompileError;
use crate::library::LibraryRegistry;
use crate::naming::NameAllocator;
use crate::nodes::{Args, EmitContext, NodeKind, NodeRegistry, Signature, Stage, OUTPUT_MATERIAL};
use crate::tree::{Node, NodeTree, SocketRef};
use crate::types::SocketType;

/// What an output root drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootTarget {
    /// The fragment color (`vec4`).
    Color,
    /// Coverage; fragments below the cutoff are discarded (`float`).
    Alpha,
    /// Object-space vertex offset (`vec3`).
    Displacement,
}

impl RootTarget {
    /// The type the root value is converted to.
    pub fn ty(self) -> SocketType {
        match self {
            RootTarget::Color => SocketType::Vec4,
            RootTarget::Alpha => SocketType::Float,
            RootTarget::Displacement => SocketType::Vec3,
        }
    }

    /// The stage evaluating the root.
    pub fn stage(self) -> Stage {
        match self {
            RootTarget::Displacement => Stage::Vertex,
            RootTarget::Color | RootTarget::Alpha => Stage::Fragment,
        }
    }
}

impl fmt::Display for RootTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RootTarget::Color => "color",
            RootTarget::Alpha => "alpha",
            RootTarget::Displacement => "displacement",
        })
    }
}

/// An output socket requested as a program output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRoot {
    /// What it drives.
    pub target: RootTarget,
    /// The node output providing the value.
    pub socket: SocketRef,
}

impl OutputRoot {
    /// Creates a root from a `"node.socket"` path.
    pub fn parse(target: RootTarget, path: &str) -> Result<Self, CompileError> {
        let socket = SocketRef::parse(path)
            .ok_or_else(|| CompileError::MalformedTree(format!("invalid root path '{path}'")))?;
        Ok(Self { target, socket })
    }
}

/// A vertex/fragment source pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Vertex stage source.
    pub vertex: String,
    /// Fragment stage source.
    pub fragment: String,
}

/// The code one node contributes to a stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NodeCode {
    pub(crate) statements: Vec<String>,
    pub(crate) requires: Requirements,
}

/// Evaluated nodes of one stage, keyed by node index, in dependency order.
pub(crate) type StageCode = IndexMap<usize, NodeCode>;

#[derive(Debug, Clone, PartialEq)]
struct ResolvedRoot {
    target: RootTarget,
    node: usize,
    expr: String,
}

/// A successful compile.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    sources: ShaderSources,
    cache: CompilationCache,
    includes: IndexMap<String, String>,
    vertex: StageCode,
    fragment: StageCode,
    alpha_nodes: Vec<usize>,
    roots: Vec<ResolvedRoot>,
}

impl CompiledShader {
    /// The vertex stage source.
    pub fn vertex(&self) -> &str {
        &self.sources.vertex
    }

    /// The fragment stage source.
    pub fn fragment(&self) -> &str {
        &self.sources.fragment
    }

    /// Both sources.
    pub fn sources(&self) -> &ShaderSources {
        &self.sources
    }

    /// Uniforms, defines, varyings, includes and hooks of the program.
    pub fn cache(&self) -> &CompilationCache {
        &self.cache
    }

    /// Returns true if the tree drives the given target.
    pub fn has_root(&self, target: RootTarget) -> bool {
        self.root(target).is_some()
    }

    fn root(&self, target: RootTarget) -> Option<&str> {
        root_expr(&self.roots, target)
    }

    /// A depth-only program for shadow passes.
    ///
    /// Keeps displacement and the alpha cutoff and drops color. Built from
    /// the code generated during the compile; the graph is not evaluated
    /// again.
    pub fn depth_variant(&self) -> ShaderSources {
        let fragment: Vec<&NodeCode> = self
            .alpha_nodes
            .iter()
            .filter_map(|i| self.fragment.get(i))
            .collect();
        let vertex: Vec<&NodeCode> = self.vertex.values().collect();
        let program = emit::Program {
            cache: &self.cache,
            includes: &self.includes,
        };
        ShaderSources {
            vertex: program.vertex(&vertex, &fragment, self.root(RootTarget::Displacement)),
            fragment: program.fragment(&fragment, None, self.root(RootTarget::Alpha), true),
        }
    }
}

/// The tree after validation: implementations, signatures, resolved links
/// and an evaluation order.
struct Graph<'a> {
    tree: &'a NodeTree,
    kinds: Vec<&'a dyn NodeKind>,
    signatures: Vec<Signature>,
    sources: Vec<IndexMap<String, (usize, String)>>,
    variables: Vec<IndexMap<String, String>>,
    order: Vec<usize>,
}

impl<'a> Graph<'a> {
    fn resolve(tree: &'a NodeTree, registry: &'a NodeRegistry, names: &mut NameAllocator) -> Result<Self, CompileError> {
        let mut kinds = Vec::with_capacity(tree.len());
        let mut signatures = Vec::with_capacity(tree.len());
        for node in tree.nodes() {
            let kind = registry.get(node.kind()).ok_or_else(|| CompileError::UnknownNodeType {
                node: node.id().to_string(),
                kind: node.kind().to_string(),
            })?;
            let signature = kind.signature(node)?;
            check_literals(node, &signature)?;
            check_declared_outputs(node, &signature)?;
            kinds.push(kind);
            signatures.push(signature);
        }

        let mut sources: Vec<IndexMap<String, (usize, String)>> = vec![IndexMap::new(); tree.len()];
        for link in tree.links() {
            let (Some(from), Some(to)) = (tree.index_of(&link.from.node), tree.index_of(&link.to.node)) else {
                return Err(CompileError::DanglingLink {
                    from: link.from.to_string(),
                    to: link.to.to_string(),
                });
            };
            let from_ty = signatures[from]
                .output_type(&link.from.socket)
                .ok_or_else(|| unknown_socket(&link.from))?;
            let to_ty = signatures[to]
                .input_type(&link.to.socket)
                .ok_or_else(|| unknown_socket(&link.to))?;
            if from_ty.convert("value", to_ty).is_none() {
                return Err(CompileError::TypeMismatch {
                    node: link.to.node.clone(),
                    socket: link.to.socket.clone(),
                    from: from_ty,
                    to: to_ty,
                });
            }

            let source = (from, link.from.socket.clone());
            match sources[to].get(&link.to.socket) {
                Some(existing) if *existing == source => {}
                Some(_) => {
                    return Err(CompileError::DuplicateLink {
                        node: link.to.node.clone(),
                        socket: link.to.socket.clone(),
                    })
                }
                None => {
                    sources[to].insert(link.to.socket.clone(), source);
                }
            }
        }

        let edges: Vec<(usize, usize)> = sources
            .iter()
            .enumerate()
            .flat_map(|(to, inputs)| inputs.values().map(move |(from, _)| (*from, to)))
            .collect();
        let order = topological_sort(0..tree.len(), edges).map_err(|cycle| CompileError::Cycle {
            nodes: cycle
                .nodes
                .iter()
                .filter_map(|i| tree.node_at(*i))
                .map(|node| node.id().to_string())
                .collect(),
        })?;

        let variables = tree
            .nodes()
            .zip(&signatures)
            .map(|(node, signature)| {
                signature
                    .outputs
                    .iter()
                    .map(|(socket, _)| (socket.clone(), names.allocate(&["n", node.id(), socket.as_str()])))
                    .collect()
            })
            .collect();

        Ok(Self {
            tree,
            kinds,
            signatures,
            sources,
            variables,
            order,
        })
    }

    fn node(&self, index: usize) -> Result<&'a Node, CompileError> {
        self.tree
            .node_at(index)
            .ok_or_else(|| CompileError::UnknownNode(format!("#{index}")))
    }

    fn output(&self, index: usize, socket: &str) -> Result<(&str, SocketType), CompileError> {
        let ty = self.signatures[index].output_type(socket);
        let variable = self.variables[index].get(socket);
        match (variable, ty) {
            (Some(variable), Some(ty)) => Ok((variable.as_str(), ty)),
            _ => Err(CompileError::UnknownSocket {
                node: self.node(index)?.id().to_string(),
                socket: socket.to_string(),
            }),
        }
    }

    /// `seeds` and everything they transitively read from.
    fn closure(&self, seeds: impl IntoIterator<Item = usize>) -> HashSet<usize> {
        let mut seen = HashSet::new();
        let mut stack: Vec<usize> = seeds.into_iter().collect();
        while let Some(index) = stack.pop() {
            if seen.insert(index) {
                stack.extend(self.sources[index].values().map(|(from, _)| *from));
            }
        }
        seen
    }
}

fn root_expr(roots: &[ResolvedRoot], target: RootTarget) -> Option<&str> {
    roots
        .iter()
        .find(|r| r.target == target)
        .map(|r| r.expr.as_str())
}

fn root_nodes(roots: &[ResolvedRoot], keep: impl Fn(RootTarget) -> bool) -> Vec<usize> {
    roots
        .iter()
        .filter(|r| keep(r.target))
        .map(|r| r.node)
        .collect()
}

fn unknown_socket(socket: &SocketRef) -> CompileError {
    CompileError::UnknownSocket {
        node: socket.node.clone(),
        socket: socket.socket.clone(),
    }
}

/// Authored literals must parse as their socket's type. Literals for
/// sockets the implementation does not model are ignored.
fn check_literals(node: &Node, signature: &Signature) -> Result<(), CompileError> {
    for socket in node.literal_inputs() {
        let Some(input) = signature.inputs.iter().find(|i| i.name == socket) else {
            log::debug!("Node '{}': ignoring literal for unmodelled input '{socket}'.", node.id());
            continue;
        };
        if input.default.is_none() {
            continue;
        }
        if let Some(value) = node.literal(socket) {
            if input.ty.literal(value).is_none() {
                return Err(CompileError::MalformedNode {
                    node: node.id().to_string(),
                    reason: format!("input '{socket}' expects a {} literal, got {value}", input.ty),
                });
            }
        }
    }
    Ok(())
}

/// Declared output types must match what the node produces.
fn check_declared_outputs(node: &Node, signature: &Signature) -> Result<(), CompileError> {
    for (socket, declared) in node.outputs() {
        let Some(declared) = declared else {
            continue;
        };
        match signature.output_type(socket) {
            Some(produced) if produced != declared => {
                return Err(CompileError::TypeMismatch {
                    node: node.id().to_string(),
                    socket: socket.to_string(),
                    from: produced,
                    to: declared,
                })
            }
            Some(_) => {}
            None => log::debug!("Node '{}': ignoring declared output '{socket}'.", node.id()),
        }
    }
    Ok(())
}

/// Compiles node trees with a fixed set of node types and library
/// fragments.
#[derive(Debug)]
pub struct ShaderCompiler {
    nodes: NodeRegistry,
    library: LibraryRegistry,
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        Self::new(NodeRegistry::builtin(), LibraryRegistry::builtin())
    }
}

impl ShaderCompiler {
    /// Creates a compiler from explicit registries.
    pub fn new(nodes: NodeRegistry, library: LibraryRegistry) -> Self {
        Self { nodes, library }
    }

    /// The node types this compiler knows.
    pub fn nodes_mut(&mut self) -> &mut NodeRegistry {
        &mut self.nodes
    }

    /// The library fragments nodes may include.
    pub fn library_mut(&mut self) -> &mut LibraryRegistry {
        &mut self.library
    }

    /// Parses and compiles a tree, inferring roots from its material output.
    pub fn compile_json(&self, tree: &Value) -> Result<CompiledShader, CompileError> {
        let tree = NodeTree::from_json(tree)?;
        self.compile(&tree, &[])
    }

    /// Compiles `tree`. With no explicit `roots`, they are read from the
    /// links into the tree's material output node.
    pub fn compile(&self, tree: &NodeTree, roots: &[OutputRoot]) -> Result<CompiledShader, CompileError> {
        let mut names = NameAllocator::new();
        let graph = Graph::resolve(tree, &self.nodes, &mut names)?;
        let roots = resolve_roots(&graph, roots)?;

        let fragment_members = graph.closure(root_nodes(&roots, |t| t.stage() == Stage::Fragment));
        let vertex_members = graph.closure(root_nodes(&roots, |t| t.stage() == Stage::Vertex));

        let mut cache = CompilationCache::default();
        let fragment = self.evaluate(&graph, Stage::Fragment, &fragment_members, &mut cache, &mut names)?;
        let vertex = self.evaluate(&graph, Stage::Vertex, &vertex_members, &mut cache, &mut names)?;

        let alpha_members = graph.closure(root_nodes(&roots, |t| t == RootTarget::Alpha));
        let alpha_nodes = fragment
            .keys()
            .copied()
            .filter(|i| alpha_members.contains(i))
            .collect();

        let mut includes = IndexMap::new();
        for name in cache.includes() {
            let fragment = self
                .library
                .get(name)
                .ok_or_else(|| CompileError::UnknownLibrary(name.clone()))?;
            includes.insert(name.clone(), fragment.source.trim().to_string());
        }

        let program = emit::Program {
            cache: &cache,
            includes: &includes,
        };
        let fragment_code: Vec<&NodeCode> = fragment.values().collect();
        let vertex_code: Vec<&NodeCode> = vertex.values().collect();
        let sources = ShaderSources {
            vertex: program.vertex(&vertex_code, &fragment_code, root_expr(&roots, RootTarget::Displacement)),
            fragment: program.fragment(
                &fragment_code,
                root_expr(&roots, RootTarget::Color),
                root_expr(&roots, RootTarget::Alpha),
                false,
            ),
        };

        log::debug!(
            "Compiled node tree: {} of {} nodes evaluated, {} uniforms, {} includes.",
            fragment.len() + vertex.len(),
            tree.len(),
            cache.uniforms().len(),
            cache.includes().len()
        );

        Ok(CompiledShader {
            sources,
            cache,
            includes,
            vertex,
            fragment,
            alpha_nodes,
            roots,
        })
    }

    /// Evaluates `members` for one stage in dependency order. Each node is
    /// visited once; consumers read its output variables.
    fn evaluate(
        &self,
        graph: &Graph<'_>,
        stage: Stage,
        members: &HashSet<usize>,
        cache: &mut CompilationCache,
        names: &mut NameAllocator,
    ) -> Result<StageCode, CompileError> {
        let mut code = StageCode::new();
        for &index in graph.order.iter().filter(|i| members.contains(i)) {
            let node = graph.node(index)?;
            let signature = &graph.signatures[index];

            let mut args = Args::new(node.id());
            for input in &signature.inputs {
                if let Some((from, socket)) = graph.sources[index].get(&input.name) {
                    let (variable, ty) = graph.output(*from, socket)?;
                    let expr = ty.convert(variable, input.ty).ok_or_else(|| CompileError::TypeMismatch {
                        node: node.id().to_string(),
                        socket: input.name.clone(),
                        from: ty,
                        to: input.ty,
                    })?;
                    args.insert(&input.name, expr, true);
                    continue;
                }
                let expr = match &input.default {
                    None => String::new(),
                    Some(default) => {
                        let value = node.literal(&input.name).unwrap_or(default);
                        input.ty.literal(value).ok_or_else(|| CompileError::MalformedNode {
                            node: node.id().to_string(),
                            reason: format!("input '{}' expects a {} literal", input.name, input.ty),
                        })?
                    }
                };
                args.insert(&input.name, expr, false);
            }

            let mut node_code = NodeCode::default();
            let exprs = {
                let mut ctx = EmitContext {
                    stage,
                    node: node.id(),
                    cache: &mut *cache,
                    library: &self.library,
                    names: &mut *names,
                    requires: &mut node_code.requires,
                    statements: &mut node_code.statements,
                };
                graph.kinds[index].emit(node, &args, &mut ctx)?
            };
            if exprs.len() != signature.outputs.len() {
                return Err(CompileError::MalformedNode {
                    node: node.id().to_string(),
                    reason: format!(
                        "'{}' produced {} outputs, expected {}",
                        graph.kinds[index].name(),
                        exprs.len(),
                        signature.outputs.len()
                    ),
                });
            }
            for ((socket, ty), expr) in signature.outputs.iter().zip(exprs) {
                let (variable, _) = graph.output(index, socket)?;
                node_code
                    .statements
                    .push(format!("{} {variable} = {expr};", ty.glsl()));
            }
            code.insert(index, node_code);
        }
        Ok(code)
    }
}

fn resolve_roots(graph: &Graph<'_>, roots: &[OutputRoot]) -> Result<Vec<ResolvedRoot>, CompileError> {
    let requested: Vec<(RootTarget, usize, String)> = if roots.is_empty() {
        infer_roots(graph)?
    } else {
        roots
            .iter()
            .map(|root| {
                let node = graph
                    .tree
                    .index_of(&root.socket.node)
                    .ok_or_else(|| CompileError::UnknownNode(root.socket.node.clone()))?;
                Ok((root.target, node, root.socket.socket.clone()))
            })
            .collect::<Result<_, CompileError>>()?
    };
    if requested.is_empty() {
        return Err(CompileError::MissingRoot);
    }

    let mut resolved: Vec<ResolvedRoot> = Vec::with_capacity(requested.len());
    for (target, node, socket) in requested {
        if resolved.iter().any(|r| r.target == target) {
            return Err(CompileError::DuplicateRoot(target));
        }
        let (variable, ty) = graph.output(node, &socket)?;
        let expr = ty.convert(variable, target.ty()).ok_or_else(|| CompileError::TypeMismatch {
            node: graph.tree.node_at(node).map(|n| n.id().to_string()).unwrap_or_default(),
            socket: socket.clone(),
            from: ty,
            to: target.ty(),
        })?;
        resolved.push(ResolvedRoot { target, node, expr });
    }
    Ok(resolved)
}

/// Reads roots from the links into the active material output.
fn infer_roots(graph: &Graph<'_>) -> Result<Vec<(RootTarget, usize, String)>, CompileError> {
    let outputs: Vec<usize> = (0..graph.kinds.len())
        .filter(|i| graph.kinds[*i].name() == OUTPUT_MATERIAL)
        .collect();
    let active = outputs
        .iter()
        .copied()
        .find(|i| {
            graph
                .tree
                .node_at(*i)
                .and_then(|n| n.bool_property("is_active_output"))
                .unwrap_or(false)
        })
        .or_else(|| outputs.first().copied())
        .ok_or(CompileError::MissingRoot)?;

    Ok([
        ("surface", RootTarget::Color),
        ("alpha", RootTarget::Alpha),
        ("displacement", RootTarget::Displacement),
    ]
    .into_iter()
    .filter_map(|(socket, target)| {
        graph.sources[active]
            .get(socket)
            .map(|(from, from_socket)| (target, *from, from_socket.clone()))
    })
    .collect())
}
