use crate::error::{ClassifyError, ModelError};
use crate::results::ClassScore;
use candle_core::{DType, Device, Tensor};
use candle_onnx::onnx::{self, tensor_shape_proto::dimension, type_proto};
use candle_onnx::{read_file, simple_eval};
use hf_hub::api::sync::Api;
use image::imageops::FilterType;
use image::DynamicImage;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub trait Classifier {
    /// Raw per-class scores for one frame, in class-index order.
    fn classify(&mut self, image: &DynamicImage) -> Result<Vec<ClassScore>, ClassifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Nchw,
    Nhwc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub input: InputSpec,
    pub output: String,
}

/// Checks that the graph has a single output and an image-shaped input.
pub fn inspect_model(model: &onnx::ModelProto) -> Result<ModelSpec, ModelError> {
    let graph = model.graph.as_ref().ok_or(ModelError::MissingGraph)?;
    if graph.output.len() != 1 {
        return Err(ModelError::OutputCount(graph.output.len()));
    }
    // older exporters list weights among the graph inputs
    let weights: HashSet<&str> = graph.initializer.iter().map(|t| t.name.as_str()).collect();
    let input = graph
        .input
        .iter()
        .find(|i| !weights.contains(i.name.as_str()))
        .ok_or(ModelError::MissingInput)?;
    let dims = tensor_dims(input).ok_or(ModelError::MissingInput)?;
    let input = input_spec(&input.name, &dims).ok_or(ModelError::InputShape(dims))?;
    Ok(ModelSpec {
        input,
        output: graph.output[0].name.clone(),
    })
}

/// Symbolic dimensions are reported as -1.
fn tensor_dims(info: &onnx::ValueInfoProto) -> Option<Vec<i64>> {
    let Some(type_proto::Value::TensorType(tensor)) = info.r#type.as_ref()?.value.as_ref() else {
        return None;
    };
    let shape = tensor.shape.as_ref()?;
    Some(
        shape
            .dim
            .iter()
            .map(|d| match &d.value {
                Some(dimension::Value::DimValue(v)) => *v,
                _ => -1,
            })
            .collect(),
    )
}

fn input_spec(name: &str, dims: &[i64]) -> Option<InputSpec> {
    let &[batch, a, b, c] = dims else {
        return None;
    };
    if batch != 1 && batch != -1 {
        return None;
    }
    let is_channels = |v: i64| v == 1 || v == 3;
    let (channels, height, width, layout) = if is_channels(a) && b > 0 && c > 0 {
        (a, b, c, Layout::Nchw)
    } else if is_channels(c) && a > 0 && b > 0 {
        (c, a, b, Layout::Nhwc)
    } else {
        return None;
    };
    Some(InputSpec {
        name: name.to_string(),
        width: width as usize,
        height: height as usize,
        channels: channels as usize,
        layout,
    })
}

/// Uses the local file when present, otherwise fetches `path` from `repo` on
/// the Hugging Face hub.
pub fn resolve_model_path(path: &Path, repo: Option<&str>) -> Result<PathBuf, ModelError> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    let Some(repo) = repo else {
        return Err(ModelError::NotFound(path.to_path_buf()));
    };
    info!(repo, file = %path.display(), "downloading model");
    let fetched = Api::new()?
        .model(repo.to_string())
        .get(&path.to_string_lossy())?;
    Ok(fetched)
}

pub struct OnnxClassifier {
    model: onnx::ModelProto,
    spec: ModelSpec,
    device: Device,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let model = read_file(path)?;
        let spec = inspect_model(&model)?;
        debug!(input = ?spec.input, output = %spec.output, "model loaded");
        Ok(Self {
            model,
            spec,
            device: Device::Cpu,
        })
    }

    fn prepare(&self, image: &DynamicImage) -> Result<Tensor, candle_core::Error> {
        let input = &self.spec.input;
        let img = image.resize_exact(
            input.width as u32,
            input.height as u32,
            FilterType::CatmullRom,
        );
        let data = if input.channels == 1 {
            img.into_luma8().into_raw()
        } else {
            img.into_rgb8().into_raw()
        };
        let shape = (input.height, input.width, input.channels);
        let tensor = Tensor::from_vec(data, shape, &self.device)?
            .to_dtype(DType::F32)?
            .affine(1.0 / 255.0, 0.0)?;
        let tensor = match input.layout {
            Layout::Nchw => tensor.permute((2, 0, 1))?.contiguous()?,
            Layout::Nhwc => tensor,
        };
        tensor.unsqueeze(0)
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&mut self, image: &DynamicImage) -> Result<Vec<ClassScore>, ClassifyError> {
        let tensor = self.prepare(image)?;
        let mut inputs = HashMap::new();
        inputs.insert(self.spec.input.name.clone(), tensor);
        let mut outputs = simple_eval(&self.model, inputs)?;
        let output = outputs
            .remove(&self.spec.output)
            .ok_or_else(|| ClassifyError::MissingOutput(self.spec.output.clone()))?;
        let scores = output
            .flatten_all()?
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()?;
        Ok(scores
            .into_iter()
            .enumerate()
            .map(|(index, score)| ClassScore::new(index, score))
            .collect())
    }
}
