//! ResNet-50 feature extractor.
//!
//! This is torchvision's ResNet-50 with the final fully connected layer
//! removed: the network maps a `(batch, 3, H, W)` image batch to a
//! `(batch, 2048)` embedding through global average pooling.
//!
//! Parameters are named after the `nn.Sequential` wrapper the backbone was
//! trained in, where children are addressed by index:
//!
//! | index | module   |
//! |-------|----------|
//! | 0     | conv1    |
//! | 1     | bn1      |
//! | 4..=7 | layer1..layer4 |
//!
//! Indices 2, 3 and 8 are parameterless (ReLU, max pool, average pool).

use candle_core::{D, Tensor};
use candle_nn::{BatchNorm, Conv2d, Conv2dConfig, Module, ModuleT, VarBuilder};

/// Length of the embedding produced by [`ResNet50Features`].
pub const RESNET50_FEATURE_DIM: usize = 2048;

/// Bottleneck blocks per stage.
const STAGE_BLOCKS: [usize; 4] = [3, 4, 6, 3];
/// Bottleneck width per stage, before the 4x expansion.
const STAGE_WIDTHS: [usize; 4] = [64, 128, 256, 512];
const EXPANSION: usize = 4;
/// Sequential index of `layer1`.
const FIRST_STAGE_INDEX: usize = 4;
const BN_EPS: f64 = 1e-5;

fn conv_config(stride: usize, padding: usize) -> Conv2dConfig {
    Conv2dConfig {
        stride,
        padding,
        dilation: 1,
        groups: 1,
        cudnn_fwd_algo: None,
    }
}

/// A bias-free convolution followed by batch norm in inference mode.
#[derive(Debug, Clone)]
struct ConvBn {
    conv: Conv2d,
    bn: BatchNorm,
}

impl ConvBn {
    fn load(
        c_in: usize,
        c_out: usize,
        kernel: usize,
        stride: usize,
        padding: usize,
        conv_vb: VarBuilder,
        bn_vb: VarBuilder,
    ) -> candle_core::Result<Self> {
        let conv = candle_nn::conv2d_no_bias(
            c_in,
            c_out,
            kernel,
            conv_config(stride, padding),
            conv_vb,
        )?;
        let bn = candle_nn::batch_norm(c_out, BN_EPS, bn_vb)?;
        Ok(Self { conv, bn })
    }

    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        // Running statistics only; batch statistics are never used at serve time.
        self.bn.forward_t(&self.conv.forward(xs)?, false)
    }
}

/// ResNet v1.5 bottleneck: 1x1 reduce, 3x3 (strided), 1x1 expand.
#[derive(Debug, Clone)]
struct Bottleneck {
    reduce: ConvBn,
    spatial: ConvBn,
    expand: ConvBn,
    downsample: Option<ConvBn>,
}

impl Bottleneck {
    fn load(c_in: usize, width: usize, stride: usize, vb: VarBuilder) -> candle_core::Result<Self> {
        let c_out = width * EXPANSION;
        let reduce = ConvBn::load(c_in, width, 1, 1, 0, vb.pp("conv1"), vb.pp("bn1"))?;
        let spatial = ConvBn::load(width, width, 3, stride, 1, vb.pp("conv2"), vb.pp("bn2"))?;
        let expand = ConvBn::load(width, c_out, 1, 1, 0, vb.pp("conv3"), vb.pp("bn3"))?;
        let downsample = if stride != 1 || c_in != c_out {
            let ds = vb.pp("downsample");
            Some(ConvBn::load(c_in, c_out, 1, stride, 0, ds.pp("0"), ds.pp("1"))?)
        } else {
            None
        };
        Ok(Self {
            reduce,
            spatial,
            expand,
            downsample,
        })
    }

    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let shortcut = match &self.downsample {
            Some(downsample) => downsample.forward(xs)?,
            None => xs.clone(),
        };
        let ys = self.reduce.forward(xs)?.relu()?;
        let ys = self.spatial.forward(&ys)?.relu()?;
        let ys = self.expand.forward(&ys)?;
        (ys + shortcut)?.relu()
    }
}

/// ResNet-50 backbone without its classification layer.
#[derive(Debug, Clone)]
pub struct ResNet50Features {
    stem: ConvBn,
    stages: Vec<Vec<Bottleneck>>,
}

impl ResNet50Features {
    /// Loads the backbone from `vb`, which must point at the sequential wrapper.
    pub fn load(vb: VarBuilder) -> candle_core::Result<Self> {
        let stem = ConvBn::load(3, 64, 7, 2, 3, vb.pp("0"), vb.pp("1"))?;

        let mut c_in = 64;
        let mut stages = Vec::with_capacity(STAGE_BLOCKS.len());
        for (stage_idx, (&blocks, &width)) in STAGE_BLOCKS.iter().zip(&STAGE_WIDTHS).enumerate() {
            let stage_vb = vb.pp((FIRST_STAGE_INDEX + stage_idx).to_string());
            let first_stride = if stage_idx == 0 { 1 } else { 2 };
            let mut stage = Vec::with_capacity(blocks);
            for block_idx in 0..blocks {
                let stride = if block_idx == 0 { first_stride } else { 1 };
                stage.push(Bottleneck::load(
                    c_in,
                    width,
                    stride,
                    stage_vb.pp(block_idx.to_string()),
                )?);
                c_in = width * EXPANSION;
            }
            stages.push(stage);
        }

        Ok(Self { stem, stages })
    }

    /// Maps `(batch, 3, H, W)` to `(batch, 2048)`.
    pub fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let mut xs = self
            .stem
            .forward(xs)?
            .relu()?
            // Zero padding is equivalent to -inf padding after a ReLU.
            .pad_with_zeros(D::Minus1, 1, 1)?
            .pad_with_zeros(D::Minus2, 1, 1)?
            .max_pool2d_with_stride(3, 2)?;

        for stage in &self.stages {
            for block in stage {
                xs = block.forward(&xs)?;
            }
        }

        xs.mean(D::Minus1)?.mean(D::Minus1)
    }
}
