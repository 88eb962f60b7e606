//! GLSL ES 3.00 sources for the cloud scene.

/// Pass-through: quad corners are already in clip space.
pub const VERTEX_SHADER: &str = r#"#version 300 es
in vec2 position;
in vec2 texCoord;
out vec2 vUv;

void main() {
    vUv = texCoord;
    gl_Position = vec4(position, 0.0, 1.0);
}
"#;

/// Value-noise fBm clouds over a sky gradient, drifting with `iTime`.
pub const FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

in vec2 vUv;
uniform float iTime;
uniform vec2 iResolution;
out vec4 fragColor;

const int OCTAVES = 5;

float hash(vec2 p) {
    p = fract(p * vec2(123.34, 456.21));
    p += dot(p, p + 45.32);
    return fract(p.x * p.y);
}

float noise(vec2 p) {
    vec2 i = floor(p);
    vec2 f = fract(p);
    vec2 u = f * f * (3.0 - 2.0 * f);
    float a = hash(i);
    float b = hash(i + vec2(1.0, 0.0));
    float c = hash(i + vec2(0.0, 1.0));
    float d = hash(i + vec2(1.0, 1.0));
    return mix(mix(a, b, u.x), mix(c, d, u.x), u.y);
}

float fbm(vec2 p) {
    float value = 0.0;
    float amplitude = 0.5;
    mat2 rot = mat2(0.8, 0.6, -0.6, 0.8);
    for (int i = 0; i < OCTAVES; i++) {
        value += amplitude * noise(p);
        p = rot * p * 2.0 + vec2(17.0, 9.0);
        amplitude *= 0.5;
    }
    return value;
}

void main() {
    float aspect = iResolution.x / max(iResolution.y, 1.0);
    vec2 p = vec2(vUv.x * aspect, vUv.y) * 3.0;

    vec2 drift = vec2(iTime * 0.03, iTime * 0.01);
    vec2 warp = vec2(fbm(p + drift), fbm(p - drift + vec2(5.2, 1.3)));
    float density = fbm(p + 1.5 * warp + drift * 2.0);
    density = smoothstep(0.35, 0.85, density);

    vec3 horizon = vec3(0.75, 0.87, 0.96);
    vec3 zenith = vec3(0.25, 0.52, 0.86);
    vec3 sky = mix(horizon, zenith, vUv.y);
    vec3 cloud = mix(vec3(0.82, 0.85, 0.9), vec3(1.0), density);

    fragColor = vec4(mix(sky, cloud, density), 1.0);
}
"#;
