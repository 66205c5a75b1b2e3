use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const EPS: f64 = 1e-6;
const TOL: f64 = 1e-5;

fn random_inputs(rng: &mut StdRng, shapes: &[&[usize]], low: f64, high: f64) -> Vec<Tensor> {
    shapes
        .iter()
        .map(|shape| Tensor::rand_uniform(shape, low, high, rng).unwrap())
        .collect()
}

fn check_over_seeds<F>(shapes: &[&[usize]], low: f64, high: f64, func: F)
where
    F: Fn(&mut Graph, &[NodeId]) -> Result<NodeId, GradNetError>,
{
    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let inputs = random_inputs(&mut rng, shapes, low, high);
        check_gradients(&func, &inputs, EPS, TOL)
            .unwrap_or_else(|e| panic!("seed {}: {}", seed, e));
    }
}

#[test]
fn test_grad_check_add() {
    check_over_seeds(&[&[], &[]], -2.0, 2.0, |g, x| g.add(x[0], x[1]));
    check_over_seeds(&[&[2, 3], &[2, 3]], -2.0, 2.0, |g, x| g.add(x[0], x[1]));
}

#[test]
fn test_grad_check_mul() {
    check_over_seeds(&[&[], &[]], -2.0, 2.0, |g, x| g.mul(x[0], x[1]));
    check_over_seeds(&[&[4], &[4]], -2.0, 2.0, |g, x| g.mul(x[0], x[1]));
    // Scalar operand against an array.
    check_over_seeds(&[&[3], &[]], -2.0, 2.0, |g, x| g.mul(x[0], x[1]));
}

#[test]
fn test_grad_check_matmul() {
    check_over_seeds(&[&[2, 3], &[3, 4]], -1.0, 1.0, |g, x| g.matmul(x[0], x[1]));
}

#[test]
fn test_grad_check_pow() {
    check_over_seeds(&[&[3]], 0.5, 2.0, |g, x| g.pow(x[0], 3.0));
    check_over_seeds(&[&[3]], 0.5, 2.0, |g, x| g.pow(x[0], 0.5));
    check_over_seeds(&[&[3]], 0.5, 2.0, |g, x| g.pow(x[0], -2.0));
}

#[test]
fn test_grad_check_exp_and_tanh() {
    check_over_seeds(&[&[2, 2]], -1.5, 1.5, |g, x| g.exp(x[0]));
    check_over_seeds(&[&[2, 2]], -1.5, 1.5, |g, x| g.tanh(x[0]));
}

#[test]
fn test_grad_check_sub_neg_div() {
    check_over_seeds(&[&[3], &[3]], -2.0, 2.0, |g, x| g.sub(x[0], x[1]));
    check_over_seeds(&[&[3]], -2.0, 2.0, |g, x| g.neg(x[0]));
    check_over_seeds(&[&[3], &[3]], 0.5, 2.0, |g, x| g.div(x[0], x[1]));
}

#[test]
fn test_grad_check_composite_expression() {
    // tanh(x @ w) * exp(x @ w) - (x @ w)^2 / 3
    check_over_seeds(&[&[2, 3], &[3, 2]], -1.0, 1.0, |g, x| {
        let h = g.matmul(x[0], x[1])?;
        let t = g.tanh(h)?;
        let e = g.exp(h)?;
        let te = g.mul(t, e)?;
        let sq = g.pow(h, 2.0)?;
        let third = g.div(sq, 3.0)?;
        g.sub(te, third)
    });
}

#[test]
fn test_grad_check_shared_operand_paths() {
    // x^2 + (x + 1): x reaches the output through three paths.
    let inputs = vec![Tensor::scalar(1.0)];
    let result = check_gradients(
        |g: &mut Graph, x: &[NodeId]| {
            let shifted = g.add(x[0], 1.0)?;
            let sq = g.mul(x[0], x[0])?;
            g.add(sq, shifted)
        },
        &inputs,
        EPS,
        TOL,
    );
    assert!(result.is_ok());
}

#[test]
fn test_grad_check_forward_error_is_wrapped() {
    let inputs = vec![Tensor::zeros(&[2]), Tensor::zeros(&[3])];
    let result = check_gradients(|g: &mut Graph, x: &[NodeId]| g.add(x[0], x[1]), &inputs, EPS, TOL);
    assert!(matches!(result, Err(GradCheckError::ForwardPassError(_))));
}
