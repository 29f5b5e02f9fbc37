//! WGSL sources for the scene render step and the screen-space chain.

/// Bindings and vertex stage shared by every screen-space pass.
pub const FULLSCREEN_PRELUDE: &str = r#"
struct Uniforms {
    resolution: vec2f,
    time: f32,
    _pad: f32,
    a: vec4f,
    b: vec4f,
}

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(0) @binding(1) var input_texture: texture_2d<f32>;
@group(0) @binding(2) var input_sampler: sampler;

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> @builtin(position) vec4f {
    // Fullscreen triangle
    let corner = vec2f(f32((vi << 1u) & 2u), f32(vi & 2u));
    return vec4f(corner * 2.0 - 1.0, 0.0, 1.0);
}

fn sample_input(uv: vec2f) -> vec4f {
    return textureSample(input_texture, input_sampler, uv);
}

fn luma(c: vec3f) -> f32 {
    return dot(c, vec3f(0.299, 0.587, 0.114));
}

fn hash12(p: vec2f) -> f32 {
    let q = fract(p * vec2f(443.897, 441.423));
    let r = q + dot(q, q.yx + 19.19);
    return fract((r.x + r.y) * r.x);
}
"#;

/// a = (strength, radius, threshold, 1/bloom_width), b.x = 1/bloom_height
pub const BLOOM: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let base = sample_input(uv);
    let strength = u.a.x;
    let radius = u.a.y;
    let threshold = u.a.z;
    let texel = vec2f(u.a.w, u.b.x);
    let spread = texel * (2.0 + radius * 16.0);

    var glow = vec3f(0.0);
    var weight = 0.0;
    for (var ring = 1; ring <= 3; ring++) {
        let w = 1.0 / f32(ring);
        for (var i = 0; i < 8; i++) {
            let angle = (f32(i) + 0.5 * f32(ring)) * 0.78539816;
            let offset = vec2f(cos(angle), sin(angle)) * spread * f32(ring);
            let s = sample_input(uv + offset).rgb;
            glow += max(s - vec3f(threshold), vec3f(0.0)) * w;
            weight += w;
        }
    }
    return vec4f(base.rgb + glow / weight * strength * 3.0, base.a);
}
"#;

/// a.xy = texel size
pub const ANTI_ALIAS: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let texel = u.a.xy;
    let center = sample_input(uv);
    let nw = luma(sample_input(uv + vec2f(-1.0, -1.0) * texel).rgb);
    let ne = luma(sample_input(uv + vec2f(1.0, -1.0) * texel).rgb);
    let sw = luma(sample_input(uv + vec2f(-1.0, 1.0) * texel).rgb);
    let se = luma(sample_input(uv + vec2f(1.0, 1.0) * texel).rgb);
    let m = luma(center.rgb);

    let lo = min(m, min(min(nw, ne), min(sw, se)));
    let hi = max(m, max(max(nw, ne), max(sw, se)));

    var dir = vec2f(-((nw + ne) - (sw + se)), (nw + sw) - (ne + se));
    let reduce = max((nw + ne + sw + se) * 0.03125, 0.0078125);
    let scale = 1.0 / (min(abs(dir.x), abs(dir.y)) + reduce);
    dir = clamp(dir * scale, vec2f(-8.0), vec2f(8.0)) * texel;

    let a = 0.5 * (sample_input(uv - dir / 6.0).rgb + sample_input(uv + dir / 6.0).rgb);
    let b = 0.5 * a + 0.25 * (sample_input(uv - dir * 0.5).rgb + sample_input(uv + dir * 0.5).rgb);
    let lb = luma(b);
    let smoothed = select(b, a, lb < lo || lb > hi);
    return vec4f(select(center.rgb, smoothed, hi - lo > 0.0312), center.a);
}
"#;

/// a = (noise, scanline, flash, time), b.x = framebuffer height
pub const FILM_GRAIN: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let source = sample_input(uv);
    let noise = u.a.x;
    let scanline = clamp(u.a.y, 0.0, 1.0);
    let flash = u.a.z;
    let time = u.a.w;
    let lines = u.b.x;

    let grain = hash12(pos.xy + fract(time * 7.31) * vec2f(113.0, 271.0)) - 0.5;
    var color = source.rgb + source.rgb * grain * noise * 2.0;
    let scan = 0.5 + 0.5 * sin(uv.y * lines * 1.5);
    color = mix(color, color * scan, scanline);
    color += vec3f(flash);
    return vec4f(clamp(color, vec3f(0.0), vec3f(1.0)), source.a);
}
"#;

/// a = (intensity, texel_x, texel_y, -)
pub const CHROMATIC_ABERRATION: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let offset = (uv - 0.5) * u.a.x;
    let r = sample_input(uv + offset).r;
    let g = sample_input(uv);
    let b = sample_input(uv - offset).b;
    return vec4f(r, g.g, b, g.a);
}
"#;

/// a = (intensity, texel_x, texel_y, -)
pub const LENS_DISTORTION: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let k = u.a.x;
    let p = uv - 0.5;
    let r2 = dot(p, p);
    let warped = 0.5 + p * (1.0 + k * r2) / (1.0 + k * 0.5);
    let color = sample_input(warped);
    let inside = all(warped >= vec2f(0.0)) && all(warped <= vec2f(1.0));
    let vignette = 1.0 - k * r2 * 1.5;
    return select(vec4f(0.0, 0.0, 0.0, 1.0), vec4f(color.rgb * vignette, color.a), inside);
}
"#;

/// a = (r, g, b, alpha)
pub const OVERLAY: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let source = sample_input(uv);
    return vec4f(mix(source.rgb, u.a.rgb, clamp(u.a.w, 0.0, 1.0)), source.a);
}
"#;

/// a = (strength, center_x, center_y, -). Twelve taps toward the centre.
pub const RADIAL_BLUR: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let strength = clamp(u.a.x, 0.0, 1.0);
    let center = u.a.yz;
    var color = vec4f(0.0);
    for (var i = 0; i < 12; i++) {
        let scale = 1.0 - strength * 0.25 * f32(i) / 11.0;
        color += sample_input(center + (uv - center) * scale);
    }
    return color / 12.0;
}
"#;

/// a = (opacity, band height, -, -), b.rgb = tint. Blended over the frame.
pub const CAPTION: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let opacity = clamp(u.a.x, 0.0, 1.0);
    let top = 1.0 - u.a.y;
    let band = smoothstep(top, top + 0.04, uv.y);
    let edge = clamp(1.0 - abs(uv.x - 0.5) * 1.6, 0.0, 1.0);
    let alpha = band * edge * opacity * 0.55;
    return vec4f(u.b.rgb * alpha, alpha);
}
"#;

/// Analytic ray casting of each scene's main body: globes, rings, the
/// galactic core and the black hole. Outputs premultiplied colour and the
/// depth of the hit so particles are occluded correctly.
pub const SCENE_BODY: &str = r#"
struct Scene {
    view_proj: mat4x4f,
    group: mat4x4f,
    inv_group: mat4x4f,
    frame: mat4x4f,
    camera_pos: vec4f,     // w: tan(fov / 2)
    camera_forward: vec4f, // w: aspect
    camera_right: vec4f,   // w: time
    camera_up: vec4f,      // w: theme
    resolution: vec4f,
    params_a: vec4f,
    params_b: vec4f,
    highlight: vec4f,
    light_levels: vec4f,
    sun_dir: vec4f,
    blue_pos: vec4f,
    purple_pos: vec4f,
}

@group(0) @binding(0) var<uniform> u: Scene;
@group(0) @binding(1) var surface_texture: texture_2d<f32>;
@group(0) @binding(2) var surface_sampler: sampler;

struct FragmentOutput {
    @location(0) color: vec4f,
    @builtin(frag_depth) depth: f32,
}

const PI: f32 = 3.14159265;
const TAU: f32 = 6.2831853;
const NO_HIT: f32 = -1.0;

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> @builtin(position) vec4f {
    let corner = vec2f(f32((vi << 1u) & 2u), f32(vi & 2u));
    return vec4f(corner * 2.0 - 1.0, 0.0, 1.0);
}

fn sphere(o: vec3f, d: vec3f, r: f32) -> f32 {
    let a = dot(d, d);
    let b = dot(o, d);
    let c = dot(o, o) - r * r;
    let h = b * b - a * c;
    if h < 0.0 {
        return NO_HIT;
    }
    let s = sqrt(h);
    let t0 = (-b - s) / a;
    if t0 > 0.0 {
        return t0;
    }
    let t1 = (-b + s) / a;
    return select(NO_HIT, t1, t1 > 0.0);
}

fn plane_y(o: vec3f, d: vec3f) -> f32 {
    if abs(d.y) < 1e-6 {
        return NO_HIT;
    }
    let t = -o.y / d.y;
    return select(NO_HIT, t, t > 0.0);
}

fn depth_of(world: vec3f) -> f32 {
    let clip = u.view_proj * vec4f(world, 1.0);
    return clamp(clip.z / clip.w, 0.0, 1.0);
}

fn hash2(p: vec2f) -> f32 {
    return fract(sin(dot(p, vec2f(127.1, 311.7))) * 43758.5453);
}

fn noise2(p: vec2f) -> f32 {
    let i = floor(p);
    let f = fract(p);
    let s = f * f * (3.0 - 2.0 * f);
    let a = hash2(i);
    let b = hash2(i + vec2f(1.0, 0.0));
    let c = hash2(i + vec2f(0.0, 1.0));
    let e = hash2(i + vec2f(1.0, 1.0));
    return mix(mix(a, b, s.x), mix(c, e, s.x), s.y);
}

fn fbm(p: vec2f) -> f32 {
    var v = 0.0;
    var amp = 0.5;
    var q = p;
    for (var i = 0; i < 5; i++) {
        v += amp * noise2(q);
        q = q * 2.03;
        amp = amp * 0.5;
    }
    return v;
}

fn frame3() -> mat3x3f {
    return mat3x3f(u.frame[0].xyz, u.frame[1].xyz, u.frame[2].xyz);
}

fn lit(albedo: vec3f, n: vec3f, p: vec3f) -> vec3f {
    let levels = u.light_levels;
    let sun = normalize((u.inv_group * vec4f(-u.sun_dir.xyz, 0.0)).xyz);
    let blue = (u.inv_group * vec4f(u.blue_pos.xyz, 1.0)).xyz;
    let purple = (u.inv_group * vec4f(u.purple_pos.xyz, 1.0)).xyz;
    let key = max(dot(n, sun), 0.0) * levels.y;
    let b = max(dot(n, normalize(blue - p)), 0.0) * levels.z;
    let v = max(dot(n, normalize(purple - p)), 0.0) * levels.w;
    let accents = vec3f(0.3, 0.5, 1.0) * b + vec3f(0.7, 0.3, 1.0) * v;
    return albedo * (levels.x + key) + albedo * accents * 0.5;
}

fn ripple(p: vec3f) -> f32 {
    let d = distance(p, u.highlight.xyz);
    let wave = 0.6 + 0.4 * sin(d * 30.0 - u.camera_right.w * 10.0);
    return u.highlight.w * exp(-d * d * 6.0) * wave;
}

fn miss() -> FragmentOutput {
    var out: FragmentOutput;
    out.color = vec4f(0.0);
    out.depth = 1.0;
    return out;
}

fn glow(color: vec3f, alpha: f32) -> FragmentOutput {
    var out: FragmentOutput;
    let a = clamp(alpha, 0.0, 1.0);
    out.color = vec4f(color * a, a);
    out.depth = 1.0;
    return out;
}

fn equirect(n: vec3f, spin: f32) -> vec2f {
    let lon = atan2(n.z, n.x) + spin;
    let lat = asin(clamp(n.y, -1.0, 1.0));
    return vec2f(fract(lon / TAU), 0.5 - lat / PI);
}

fn earth(o: vec3f, d: vec3f, wo: vec3f, wd: vec3f) -> FragmentOutput {
    let spin = u.params_a.x;
    let clouds = u.params_a.y;
    let radius = u.params_a.z;
    let tilt = u.params_a.w;
    let atmosphere = radius * u.params_b.x;

    let t = sphere(o, d, radius);
    if t < 0.0 {
        if sphere(o, d, atmosphere) < 0.0 {
            return miss();
        }
        let tc = -dot(o, d) / dot(d, d);
        let h = (length(o + d * tc) - radius) / (atmosphere - radius);
        let halo = pow(1.0 - clamp(h, 0.0, 1.0), 2.0) * 0.6;
        return glow(vec3f(0.3, 0.55, 1.0) * (u.light_levels.y + 0.3), halo);
    }

    let p = o + d * t;
    let n = normalize(p);
    let c = cos(-tilt);
    let s = sin(-tilt);
    let q = vec3f(c * n.x - s * n.y, s * n.x + c * n.y, n.z);
    let uv = equirect(q, spin);
    var albedo = textureSampleLevel(surface_texture, surface_sampler, uv, 0.0).rgb;
    let cover = smoothstep(0.55, 0.75, fbm(vec2f(uv.x * 12.0 + clouds, uv.y * 6.0)));
    albedo = mix(albedo, vec3f(1.0), cover * 0.8);

    let view = -normalize(d);
    let rim = pow(1.0 - max(dot(n, view), 0.0), 3.0);
    var color = lit(albedo, n, p) + vec3f(0.3, 0.55, 1.0) * rim * 0.6;
    color += vec3f(0.4, 0.8, 1.0) * ripple(p);

    var out: FragmentOutput;
    out.color = vec4f(color, 1.0);
    out.depth = depth_of(wo + wd * t);
    return out;
}

fn ring_sample(r: f32, inner: f32, outer: f32) -> vec4f {
    if r < inner || r > outer {
        return vec4f(0.0);
    }
    let x = (r - inner) / (outer - inner);
    let bands = 0.35 + 0.45 * noise2(vec2f(r * 40.0, 0.5));
    let fade = smoothstep(0.0, 0.05, x) * smoothstep(1.0, 0.9, x);
    let alpha = bands * fade;
    return vec4f(vec3f(0.6, 0.72, 0.8) * alpha, alpha);
}

fn uranus(o: vec3f, d: vec3f, wo: vec3f, wd: vec3f) -> FragmentOutput {
    let spin = u.params_a.x;
    let radius = u.params_a.z;
    let inner = u.params_a.w;
    let outer = u.params_b.x;
    let m = frame3();
    let oc = transpose(m) * o;
    let dc = transpose(m) * d;

    let ts = sphere(oc, dc, radius);
    let tr = plane_y(oc, dc);
    var ring = vec4f(0.0);
    var ring_point = vec3f(0.0);
    if tr > 0.0 {
        ring_point = oc + dc * tr;
        ring = ring_sample(length(ring_point.xz), inner, outer);
        // Planet shadow on the ring
        let sun = transpose(m) * normalize((u.inv_group * vec4f(-u.sun_dir.xyz, 0.0)).xyz);
        let shadowed = sphere(ring_point, sun, radius) > 0.0;
        ring = vec4f(ring.rgb * select(1.0, 0.25, shadowed), ring.a);
        ring = vec4f(ring.rgb + vec3f(0.6, 0.9, 1.0) * ripple(m * ring_point) * ring.a, ring.a);
    }

    if ts < 0.0 {
        if ring.a <= 0.0 {
            return miss();
        }
        var out: FragmentOutput;
        out.color = ring;
        out.depth = depth_of(wo + wd * tr);
        return out;
    }

    let pc = oc + dc * ts;
    let nc = normalize(pc);
    let uv = equirect(nc, spin);
    var albedo = textureSampleLevel(surface_texture, surface_sampler, uv, 0.0).rgb;
    albedo = albedo * (0.92 + 0.08 * sin(nc.y * 24.0));
    let n = m * nc;
    let p = m * pc;
    var color = lit(albedo, n, p);
    color += vec3f(0.5, 0.9, 1.0) * ripple(p);

    var out: FragmentOutput;
    if tr > 0.0 && tr < ts {
        out.color = vec4f(ring.rgb + color * (1.0 - ring.a), 1.0);
        out.depth = depth_of(wo + wd * tr);
    } else {
        out.color = vec4f(color, 1.0);
        out.depth = depth_of(wo + wd * ts);
    }
    return out;
}

fn galaxy(o: vec3f, d: vec3f) -> FragmentOutput {
    let time = u.params_a.x;
    let core = u.params_a.y;
    let extent = u.params_a.z;
    let arms = u.params_a.w;
    let twist = u.params_b.x;

    let dn = normalize(d);
    let tc = max(-dot(o, dn), 0.0);
    let closest = length(o + dn * tc);
    let bulge = exp(-pow(closest / core, 2.0)) * 1.2;
    var color = vec3f(1.0, 0.85, 0.6) * bulge;
    var alpha = bulge;

    let t = plane_y(o, d);
    if t > 0.0 {
        let p = o + d * t;
        let r = length(p.xz);
        let angle = atan2(p.z, p.x);
        let wind = arms * (angle - twist * TAU * r / extent) + time * 0.05;
        let arm = pow(0.5 + 0.5 * cos(wind), 3.0);
        let falloff = exp(-r / (extent * 0.35));
        let dust = fbm(p.xz * 0.6 + vec2f(time * 0.01));
        let disk = arm * falloff * (0.5 + dust) * 0.7;
        color += mix(vec3f(0.45, 0.55, 1.0), vec3f(0.9, 0.7, 1.0), dust) * disk;
        color += vec3f(1.0, 0.9, 0.7) * ripple(p);
        alpha = max(alpha, disk);
    }
    return glow(color / max(alpha, 1e-3), alpha);
}

fn disk_sample(o: vec3f, d: vec3f) -> vec4f {
    let t = plane_y(o, d);
    if t < 0.0 {
        return vec4f(0.0);
    }
    let inner = u.params_a.z;
    let outer = u.params_a.w;
    let p = o + d * t;
    let r = length(p.xz);
    if r < inner || r > outer {
        return vec4f(0.0);
    }
    let x = (r - inner) / (outer - inner);
    let angle = atan2(p.z, p.x) - u.params_b.y * pow(inner / r, 1.5);
    let turbulence = fbm(vec2f(angle * 3.0, r * 2.0));
    let heat = pow(1.0 - x, 1.5);
    // Approaching side is brighter
    let orbit = normalize(vec3f(-p.z, 0.0, p.x));
    let beaming = 1.0 + 0.5 * dot(orbit, -normalize(d));
    let color = mix(vec3f(0.9, 0.3, 0.05), vec3f(1.0, 0.95, 0.8), heat)
        * (0.4 + turbulence) * (0.5 + heat * 1.5) * beaming;
    let alpha = smoothstep(0.0, 0.08, x) * smoothstep(1.0, 0.7, x) * (0.6 + 0.4 * turbulence);
    return vec4f(color * alpha, alpha);
}

fn black_hole(o: vec3f, d: vec3f, wo: vec3f, wd: vec3f) -> FragmentOutput {
    let horizon = u.params_a.y;
    let lensing = u.params_b.x;
    let swallow = u.params_b.w;
    let m = frame3();
    let oc = transpose(m) * o;
    let dc = normalize(transpose(m) * d);

    let tc = -dot(oc, dc);
    let pc = oc + dc * tc;
    let b = length(pc);
    let captured = tc > 0.0 && b < horizon;

    let primary = disk_sample(oc, dc);
    var lensed = vec4f(0.0);
    if tc > 0.0 {
        let bent = normalize(dc - normalize(pc) * lensing * horizon / max(b, 1e-3));
        lensed = disk_sample(pc, bent) * 0.6;
    }
    let photon = exp(-pow((b - horizon * 1.5) / (0.08 * horizon), 2.0)) * (1.0 + swallow * 3.0);
    var behind = lensed.rgb + vec3f(1.0, 0.8, 0.55) * photon;
    var behind_alpha = clamp(max(lensed.a, photon), 0.0, 1.0);
    if captured {
        behind = vec3f(0.0);
        behind_alpha = 1.0;
    }

    let color = primary.rgb + behind * (1.0 - primary.a)
        + vec3f(1.0, 0.7, 0.4) * ripple(m * (oc + dc * max(plane_y(oc, dc), 0.0)));
    let alpha = primary.a + behind_alpha * (1.0 - primary.a);

    var out: FragmentOutput;
    out.color = vec4f(color, clamp(alpha, 0.0, 1.0));
    if captured {
        let wt = sphere(o, d, horizon);
        out.depth = select(1.0, depth_of(wo + wd * wt), wt > 0.0);
    } else {
        out.depth = 1.0;
    }
    return out;
}

@fragment
fn fs(@builtin(position) pos: vec4f) -> FragmentOutput {
    let ndc = vec2f(pos.x / u.resolution.x * 2.0 - 1.0, 1.0 - pos.y / u.resolution.y * 2.0);
    let half_fov = u.camera_pos.w;
    let aspect = u.camera_forward.w;
    let wd = normalize(
        u.camera_forward.xyz
            + u.camera_right.xyz * ndc.x * half_fov * aspect
            + u.camera_up.xyz * ndc.y * half_fov
    );
    let wo = u.camera_pos.xyz;

    // Group space; the direction stays unnormalised so t is shared with world space.
    let o = (u.inv_group * vec4f(wo, 1.0)).xyz;
    let d = (u.inv_group * vec4f(wd, 0.0)).xyz;

    let theme = u32(u.camera_up.w + 0.5);
    switch theme {
        case 0u: {
            return earth(o, d, wo, wd);
        }
        case 1u: {
            return uranus(o, d, wo, wd);
        }
        case 2u: {
            return galaxy(o, d);
        }
        default: {
            return black_hole(o, d, wo, wd);
        }
    }
}
"#;

/// Camera-facing sprites for every particle system, blended additively.
pub const PARTICLES: &str = r#"
struct Particles {
    view_proj: mat4x4f,
    resolution: vec4f, // w, h, time, pixel scale
}

@group(0) @binding(0) var<uniform> u: Particles;

struct Instance {
    @location(0) position_size: vec4f,
    @location(1) color_phase: vec4f,
}

struct VertexOutput {
    @builtin(position) position: vec4f,
    @location(0) color: vec3f,
    @location(1) corner: vec2f,
}

@vertex
fn vs(@builtin(vertex_index) vi: u32, instance: Instance) -> VertexOutput {
    var corners = array<vec2f, 6>(
        vec2f(-1.0, -1.0),
        vec2f(1.0, -1.0),
        vec2f(1.0, 1.0),
        vec2f(-1.0, -1.0),
        vec2f(1.0, 1.0),
        vec2f(-1.0, 1.0),
    );
    let corner = corners[vi];
    var clip = u.view_proj * vec4f(instance.position_size.xyz, 1.0);
    let pixels = instance.position_size.w * u.resolution.w;
    clip = vec4f(clip.xy + corner * pixels / u.resolution.xy * clip.w, clip.z, clip.w);

    let twinkle = 0.75 + 0.25 * sin(u.resolution.z * 2.0 + instance.color_phase.w);

    var out: VertexOutput;
    out.position = clip;
    out.color = instance.color_phase.rgb * twinkle;
    out.corner = corner;
    return out;
}

@fragment
fn fs(in: VertexOutput) -> @location(0) vec4f {
    let falloff = 1.0 - smoothstep(0.0, 1.0, length(in.corner));
    return vec4f(in.color * falloff, falloff);
}
"#;
