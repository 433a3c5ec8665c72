const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Model {
    #[default]
    U2Net,
    U2NetP,
    Modnet,
    Rmbg14,
    Rmbg14Fp16,
    Rmbg14Quantized,
}

/// Per-channel normalization applied to `[0, 1]` pixel values before inference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalization {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Normalization {
    pub fn apply(&self, channel: usize, value: u8) -> f32 {
        (value as f32 / 255.0 - self.mean[channel]) / self.std[channel]
    }
}

impl Model {
    pub fn all_models() -> Vec<Self> {
        vec![
            Self::U2Net,
            Self::U2NetP,
            Self::Modnet,
            Self::Rmbg14,
            Self::Rmbg14Fp16,
            Self::Rmbg14Quantized,
        ]
    }

    pub fn to_input_size(&self) -> (u32, u32) {
        match self {
            Model::U2Net | Model::U2NetP => (320, 320),
            Model::Modnet => (512, 512),
            Model::Rmbg14 | Model::Rmbg14Fp16 | Model::Rmbg14Quantized => (1024, 1024),
        }
    }

    pub fn normalization(&self) -> Normalization {
        match self {
            Model::U2Net | Model::U2NetP => Normalization {
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
            },
            Model::Modnet => Normalization {
                mean: [0.5; 3],
                std: [0.5; 3],
            },
            Model::Rmbg14 | Model::Rmbg14Fp16 | Model::Rmbg14Quantized => Normalization {
                mean: [0.5; 3],
                std: [1.0; 3],
            },
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::U2Net => "u2net.onnx",
            Self::U2NetP => "u2netp.onnx",
            Self::Modnet => "modnet_photographic_portrait_matting.onnx",
            Self::Rmbg14 => "rmbg-1.4.onnx",
            Self::Rmbg14Fp16 => "rmbg-1.4_fp16.onnx",
            Self::Rmbg14Quantized => "rmbg-1.4_quantized.onnx",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::U2Net => "U2-Net",
            Self::U2NetP => "U2-Net (lite)",
            Self::Modnet => "MODNet portrait",
            Self::Rmbg14 => "RMBG 1.4",
            Self::Rmbg14Fp16 => "RMBG 1.4 fp16",
            Self::Rmbg14Quantized => "RMBG 1.4 quantized",
        }
    }

    pub fn try_from(model: &str) -> Option<Self> {
        Self::all_models().into_iter().find(|m| m.to_str() == model)
    }

    pub fn download_url(&self) -> &'static str {
        match self {
            Self::U2Net => {
                "https://github.com/danielgatis/rembg/releases/download/v0.0.0/u2net.onnx"
            }
            Self::U2NetP => {
                "https://github.com/danielgatis/rembg/releases/download/v0.0.0/u2netp.onnx"
            }
            Self::Modnet => {
                "https://huggingface.co/TheEeeeLin/HivisionIDPhotos_matting/resolve/034769305faf641ad94edfac654aba13be06e816/modnet_photographic_portrait_matting.onnx"
            }
            Self::Rmbg14 => "https://huggingface.co/briaai/RMBG-1.4/resolve/main/onnx/model.onnx",
            Self::Rmbg14Fp16 => {
                "https://huggingface.co/briaai/RMBG-1.4/resolve/main/onnx/model_fp16.onnx"
            }
            Self::Rmbg14Quantized => {
                "https://huggingface.co/briaai/RMBG-1.4/resolve/main/onnx/model_quantized.onnx"
            }
        }
    }
}
