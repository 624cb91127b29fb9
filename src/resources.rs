//! Loads the model files and turns them into scene subtrees.
//!
//! Each model is fetched by its own asynchronous task. The outcome is posted
//! to the event loop as an [`AppEvent`] so the scene is only ever touched from
//! the loop itself.

use std::{fmt, sync::Arc};

use cgmath::{InnerSpace, Quaternion, Vector3};
use winit::event_loop::EventLoopProxy;

use crate::{
    config::SceneConfig,
    model::{Material, Mesh, MeshVertex},
    scene::{NodeKind, Subtree, Transform},
    window::AppEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Earth,
    Satellite,
}

impl AssetKind {
    pub fn path(self, config: &SceneConfig) -> &str {
        match self {
            AssetKind::Earth => &config.earth_model_path,
            AssetKind::Satellite => &config.satellite_model_path,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Earth => write!(f, "Earth"),
            AssetKind::Satellite => write!(f, "Satellite"),
        }
    }
}

/// Why a model could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("couldn't read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("malformed model: {0}")]
    Parse(#[from] gltf::Error),
    #[error("model contains no scene")]
    NoScene,
}

/// Completion of one model request
#[derive(Debug)]
pub struct AssetEvent {
    pub kind: AssetKind,
    pub result: Result<Subtree, AssetError>,
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url, AssetError> {
    let fetch_error = |reason: String| AssetError::Fetch {
        url: file_name.to_string(),
        reason,
    };
    let href = web_sys::window()
        .ok_or_else(|| fetch_error("no window".to_string()))?
        .location()
        .href()
        .map_err(|e| fetch_error(format!("{:?}", e)))?;
    let base = reqwest::Url::parse(&href).map_err(|e| fetch_error(e.to_string()))?;
    base.join(file_name).map_err(|e| fetch_error(e.to_string()))
}

/// Reads a file relative to the page on the web, or from the build output natively
pub async fn load_binary(file_name: &str) -> Result<Vec<u8>, AssetError> {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            let url = format_url(file_name)?;
            let fetch_error = |e: reqwest::Error| AssetError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            };
            let data = reqwest::get(url.clone())
                .await
                .and_then(|response| response.error_for_status())
                .map_err(fetch_error)?
                .bytes()
                .await
                .map_err(fetch_error)?
                .to_vec();
        } else {
            let path = std::path::Path::new(env!("OUT_DIR")).join(file_name);
            let data = std::fs::read(&path).map_err(|source| AssetError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
    }

    Ok(data)
}

/// Builds a subtree from binary glTF. The default scene becomes a group
/// whose children are the scene's root nodes. Textures are ignored.
pub fn parse_glb(bytes: &[u8]) -> Result<Subtree, AssetError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::NoScene)?;

    let mut root = Subtree::group(scene.name().unwrap_or("Scene"));
    root.children = scene
        .nodes()
        .map(|node| convert_node(&node, &buffers))
        .collect();
    Ok(root)
}

fn convert_node(node: &gltf::Node, buffers: &[gltf::buffer::Data]) -> Subtree {
    let meshes = node
        .mesh()
        .map(|mesh| convert_mesh(&mesh, buffers))
        .unwrap_or_default();
    let kind = if meshes.is_empty() {
        NodeKind::Group
    } else {
        NodeKind::Mesh(meshes)
    };

    let (translation, rotation, scale) = node.transform().decomposed();
    let mut subtree = Subtree::new(node.name().unwrap_or_default(), kind);
    subtree.transform = Transform {
        translation: translation.into(),
        orientation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
        ..Default::default()
    };
    subtree.children = node
        .children()
        .map(|child| convert_node(&child, buffers))
        .collect();
    subtree
}

fn convert_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Vec<Arc<Mesh>> {
    mesh.primitives()
        .filter(|primitive| primitive.mode() == gltf::mesh::Mode::Triangles)
        .filter_map(|primitive| {
            let reader = primitive
                .reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(normals) => normals.collect(),
                None => compute_normals(&positions, &indices),
            };
            let vertices = positions
                .iter()
                .zip(normals)
                .map(|(&position, normal)| MeshVertex { position, normal })
                .collect();

            let pbr = primitive.material().pbr_metallic_roughness();
            let material = Material {
                color: pbr.base_color_factor(),
                metalness: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
            };
            Some(Arc::new(Mesh::new(
                mesh.name().unwrap_or_default(),
                vertices,
                indices,
                material,
            )))
        })
        .collect()
}

/// Smooth normals from area weighted face normals
fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let p = |i: usize| Vector3::from(positions[i]);
        let face = (p(b) - p(a)).cross(p(c) - p(a));
        for i in [a, b, c] {
            sums[i] += face;
        }
    }
    sums.into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

pub async fn load_model(file_name: &str) -> Result<Subtree, AssetError> {
    let bytes = load_binary(file_name).await?;
    parse_glb(&bytes)
}

/// Starts both model requests. Each posts exactly one [`AppEvent::Asset`],
/// in whatever order they finish.
pub fn request_models(config: &SceneConfig, proxy: EventLoopProxy<AppEvent>) {
    for kind in [AssetKind::Earth, AssetKind::Satellite] {
        let path = kind.path(config).to_string();
        let proxy = proxy.clone();
        let task = async move {
            let result = load_model(&path).await;
            if proxy
                .send_event(AppEvent::Asset(AssetEvent { kind, result }))
                .is_err()
            {
                log::warn!("Event loop closed before the {} model arrived", kind);
            }
        };

        cfg_if::cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                wasm_bindgen_futures::spawn_local(task);
            } else {
                std::thread::spawn(move || pollster::block_on(task));
            }
        }
    }
}
