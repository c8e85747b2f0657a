//! Burn-backed policy network, ported from the teacher's `nn_bot.rs`
//! `QuoridorNet`/`BurnPolicyValueNet`: same two-conv-plus-heads shape,
//! re-targeted at `crate::inference::Model` instead of the teacher's own
//! `PolicyValueNet` trait, and sized for this crate's 6-channel encoding and
//! 144-action move space instead of the teacher's 7/138.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{self, Initializer, Relu};
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

use crate::error::Error;
use crate::inference::{EncodedState, Model, ModelShape, Output, TrainSample};
use crate::quoridor::all_moves::ACTION_COUNT;
use crate::quoridor::encode::CHANNELS;

const CONV_OUT_CHANNELS: usize = 64;
const SPATIAL_AFTER_CONVS: usize = 5; // two 3x3 valid convs over a 9x9 input
const FLATTENED: usize = CONV_OUT_CHANNELS * SPATIAL_AFTER_CONVS * SPATIAL_AFTER_CONVS;

#[derive(Module, Debug)]
pub struct QuoridorNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    fc_policy: nn::Linear<B>,
    fc_value1: nn::Linear<B>,
    fc_value2: nn::Linear<B>,
}

pub struct QuoridorNetOutput<B: Backend> {
    pub policy: Tensor<B, 2>,
    pub value: Tensor<B, 2>,
}

impl<B: Backend> QuoridorNet<B> {
    pub fn new(device: &B::Device) -> Self {
        let init = Initializer::KaimingUniform { gain: 1.0, fan_out_only: false };
        let conv1 = Conv2dConfig::new([CHANNELS, CONV_OUT_CHANNELS], [3, 3]).with_initializer(init.clone()).init(device);
        let conv2 = Conv2dConfig::new([CONV_OUT_CHANNELS, CONV_OUT_CHANNELS], [3, 3]).with_initializer(init.clone()).init(device);
        let fc_policy = nn::LinearConfig::new(FLATTENED, ACTION_COUNT).with_initializer(init.clone()).init(device);
        let fc_value1 = nn::LinearConfig::new(FLATTENED, 64).with_initializer(init).init(device);
        let fc_value2 = nn::LinearConfig::new(64, 1).with_initializer(Initializer::XavierNormal { gain: 1.0 }).init(device);
        QuoridorNet { conv1, conv2, fc_policy, fc_value1, fc_value2 }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> QuoridorNetOutput<B> {
        let relu = Relu::new();
        let x = relu.forward(self.conv1.forward(x));
        let x = relu.forward(self.conv2.forward(x));
        let x = x.flatten(1, 3);

        let policy = self.fc_policy.forward(x.clone());
        let value = relu.forward(self.fc_value1.forward(x));
        let value = self.fc_value2.forward(value).tanh();

        QuoridorNetOutput { policy, value }
    }
}

fn batch_to_tensor<B: Backend>(batch: &[EncodedState], device: &B::Device) -> Tensor<B, 4> {
    let batch_size = batch.len();
    let mut flat: Vec<f32> = Vec::with_capacity(batch_size * CHANNELS * 9 * 9);
    for state in batch {
        flat.extend_from_slice(&state.data);
    }
    Tensor::<B, 4>::from_data(TensorData::new(flat, [batch_size, CHANNELS, 9, 9]), device)
}

pub struct QuoridorModel<B: Backend> {
    net: QuoridorNet<B>,
    device: B::Device,
    shape: ModelShape,
}

impl<B: Backend> QuoridorModel<B> {
    pub fn new(device: B::Device) -> Self {
        let net = QuoridorNet::new(&device);
        let shape = ModelShape { input_shape: vec![CHANNELS, 9, 9], output_len: ACTION_COUNT };
        QuoridorModel { net, device, shape }
    }
}

impl<B: Backend> Model for QuoridorModel<B> {
    fn shape(&self) -> &ModelShape {
        &self.shape
    }

    fn predict_batch(&self, inputs: &[EncodedState]) -> Result<Vec<Output>, Error> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let tensor = batch_to_tensor::<B>(inputs, &self.device);
        let out = self.net.forward(tensor);
        let policy_data: Vec<f32> = out.policy.into_data().to_vec().map_err(|e| Error::ModelError(format!("{e:?}")))?;
        Ok(policy_data.chunks(ACTION_COUNT).map(|chunk| Output(chunk.to_vec())).collect())
    }

    fn train_step(&mut self, _batch: &[TrainSample]) -> Result<f32, Error> {
        // Training happens out-of-process via the `Trainer` component (spec
        // component J); this model only ever serves inference locally.
        Ok(0.0)
    }

    fn snapshot(&self) -> Vec<u8> {
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::new();
        recorder.record(self.net.clone().into_record(), ()).expect("in-memory record never fails")
    }

    fn load_weights(&mut self, snapshot: &[u8]) -> Result<(), Error> {
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(snapshot.to_vec(), &self.device)
            .map_err(|e| Error::ModelError(format!("failed to load weights: {e}")))?;
        self.net = self.net.clone().load_record(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn forward_produces_expected_batch_shape() {
        let device = Default::default();
        let model = QuoridorModel::<NdArray>::new(device);
        let inputs = vec![EncodedState::new(vec![0.0; CHANNELS * 9 * 9], vec![CHANNELS, 9, 9])];
        let outputs = model.predict_batch(&inputs).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].len(), ACTION_COUNT);
    }

    #[test]
    fn snapshot_round_trips_weights() {
        let device = Default::default();
        let mut model = QuoridorModel::<NdArray>::new(device);
        let snapshot = model.snapshot();
        model.load_weights(&snapshot).unwrap();
    }
}
