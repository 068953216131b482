use aerofid::{match_template, CompiledTemplate, ImageView, MatchConfig, TemplatePlan, Template};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Textbook ZNCC over every placement; ties keep the first in row-major order.
fn brute_force_best(image: ImageView<'_, u8>, tpl: &TemplatePlan) -> (usize, usize, f64) {
    let tpl_w = tpl.width();
    let tpl_h = tpl.height();
    let n = (tpl_w * tpl_h) as f64;
    let t_prime = tpl.t_prime();

    let mut best = (0usize, 0usize, f64::NEG_INFINITY);
    for y in 0..=image.height() - tpl_h {
        for x in 0..=image.width() - tpl_w {
            let mut dot = 0.0f64;
            let mut sum_i = 0.0f64;
            let mut sum_i2 = 0.0f64;
            for ty in 0..tpl_h {
                let row = image.row(y + ty).expect("row in bounds");
                for tx in 0..tpl_w {
                    let value = row[x + tx] as f64;
                    dot += t_prime[ty * tpl_w + tx] * value;
                    sum_i += value;
                    sum_i2 += value * value;
                }
            }
            let var_i = sum_i2 - (sum_i * sum_i) / n;
            if var_i <= 1e-8 {
                continue;
            }
            let score = dot / (tpl.var_t() * var_i).sqrt();
            if score > best.2 {
                best = (x, y, score);
            }
        }
    }
    best
}

fn random_image(rng: &mut StdRng, width: usize, height: usize) -> Vec<u8> {
    let mut data = vec![0u8; width * height];
    for value in data.iter_mut() {
        *value = rng.random_range(0..=255);
    }
    data
}

#[test]
fn matcher_agrees_with_brute_force_on_random_images() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..4 {
        let (width, height) = (40, 32);
        let image = random_image(&mut rng, width, height);
        let view = ImageView::from_slice(&image, width, height).unwrap();
        let tpl_data = random_image(&mut rng, 7, 5);
        let template = Template::new(tpl_data, 7, 5).unwrap();
        let plan = template.plan().unwrap();

        let (x, y, score) = brute_force_best(view, &plan);
        let compiled = CompiledTemplate::single_level(&template).unwrap();
        let hit = match_template(view, &compiled, &MatchConfig::default()).unwrap().unwrap();
        assert_eq!((hit.col, hit.row), (x, y));
        assert!((hit.score - score).abs() < 1e-9);
    }
}

#[test]
fn noisy_copy_is_still_found() {
    let mut rng = StdRng::seed_from_u64(2024);
    let (width, height) = (64, 48);
    let image = random_image(&mut rng, width, height);
    let (x0, y0, tw, th) = (22usize, 13usize, 12usize, 10usize);

    let mut tpl_data = Vec::with_capacity(tw * th);
    for y in 0..th {
        for x in 0..tw {
            let noise: i16 = rng.random_range(-12..=12);
            let value = i16::from(image[(y0 + y) * width + x0 + x]) + noise;
            tpl_data.push(value.clamp(0, 255) as u8);
        }
    }
    let template = Template::new(tpl_data, tw, th).unwrap();
    let compiled = CompiledTemplate::single_level(&template).unwrap();
    let view = ImageView::from_slice(&image, width, height).unwrap();
    let hit = match_template(view, &compiled, &MatchConfig::default()).unwrap().unwrap();
    assert_eq!((hit.col, hit.row), (x0, y0));
    assert!(hit.score > 0.95 && hit.score < 1.0);
}
