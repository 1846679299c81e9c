use rand::{rngs::OsRng, RngCore};

/// Алфавит генератора паролей: строчные, прописные, цифры.
pub const PASSWORD_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Длина пароля по умолчанию.
pub const DEFAULT_PASSWORD_LENGTH: usize = 8;

/// Источник криптографически стойких случайных байтов.
pub trait SecureRandom: Send + Sync {
    /// Заполняет `dest` случайными байтами.
    fn fill_bytes(
        &self,
        dest: &mut [u8],
    );

    /// Возвращает `n` случайных байтов.
    fn bytes(
        &self,
        n: usize,
    ) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        self.fill_bytes(&mut buf);
        buf
    }
}

/// Источник на базе генератора операционной системы.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSecureRandom;

impl SecureRandom for OsSecureRandom {
    fn fill_bytes(
        &self,
        dest: &mut [u8],
    ) {
        OsRng.fill_bytes(dest);
    }
}

/// Генерирует случайный пароль длины `length` из [`PASSWORD_ALPHABET`].
pub fn gen_random_password(length: usize) -> String {
    gen_random_password_with(&OsSecureRandom, length)
}

/// Генерирует пароль, используя переданный источник байтов.
///
/// Первый байт задаёт начальный сдвиг, каждый следующий байт даёт один
/// символ `ALPHABET[(shift + b) % 62]`, после чего сдвиг увеличивается на
/// `b`. Смещение распределения (256 не делится на 62) не корректируется.
pub fn gen_random_password_with(
    rng: &dyn SecureRandom,
    length: usize,
) -> String {
    let base = PASSWORD_ALPHABET.len();
    let random = rng.bytes(length + 1);

    // Для выбора символа важен только остаток сдвига по модулю base.
    let mut shift = random[0] as usize % base;
    let mut password = String::with_capacity(length);

    for &b in &random[1..] {
        let b = b as usize;
        password.push(PASSWORD_ALPHABET[(shift + b) % base] as char);
        shift = (shift + b) % base;
    }

    password
}
